use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Query, call_operation};
use crate::ClientError;
use crate::cancel::CancellableRequest;
use crate::executor::{ApiFamily, RequestExecutor};
use crate::handle::ClientHandle;
use crate::operations::OperationDefinition;
use crate::registry::{DefaultInstance, InstanceRegistry};
use crate::request::CallOptions;

/// GROWI REST API v1 (`/_api`).
#[derive(Clone, Debug)]
pub struct ApiV1 {
    executor: RequestExecutor,
}

impl ApiV1 {
    pub(crate) fn new(executor: RequestExecutor) -> Self {
        debug_assert_eq!(executor.family(), ApiFamily::V1);
        Self { executor }
    }

    /// Surface that always talks to `handle`; instance names are ignored.
    pub fn from_handle(handle: ClientHandle) -> Self {
        Self::new(RequestExecutor::bound(ApiFamily::V1, handle))
    }

    /// Registry-backed surface that requires an instance name on every call.
    pub fn strict(registry: Arc<InstanceRegistry>) -> Self {
        Self::new(RequestExecutor::strict(ApiFamily::V1, registry))
    }

    /// Registry-backed surface that falls back to `default` when no
    /// instance name is given.
    pub fn with_default(registry: Arc<InstanceRegistry>, default: DefaultInstance) -> Self {
        let executor = RequestExecutor::with_default(ApiFamily::V1, registry, default);
        Self::new(executor)
    }

    /// Strict surface over [`InstanceRegistry::global`].
    pub fn global() -> Self {
        Self::strict(InstanceRegistry::global())
    }

    /// Executor every stub of this surface dispatches through.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// The v1 operation catalog.
    pub fn operations() -> &'static [OperationDefinition] {
        ApiFamily::V1.operations()
    }

    /// Calls an endpoint by `OpenAPI` `operation_id`.
    pub fn call_operation<T>(
        &self,
        operation_id: &str,
        path_params: &[(&str, &str)],
        query: &[(&str, &str)],
        body: Option<Value>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = query
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        call_operation(
            &self.executor,
            operation_id,
            path_params,
            query,
            body,
            options,
        )
    }

    fn call<T>(
        &self,
        operation_id: &str,
        query: Query,
        body: Option<Value>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        call_operation(
            &self.executor,
            operation_id,
            &[],
            query.into_pairs(),
            body,
            options,
        )
    }

    /// `GET /search`
    pub fn search<T>(
        &self,
        q: &str,
        offset: Option<u32>,
        limit: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new()
            .set("q", q)
            .opt("offset", offset)
            .opt("limit", limit);
        self.call("searchPages", query, None, options)
    }

    /// `GET /pages.list`
    pub fn list_pages<T>(
        &self,
        path: Option<&str>,
        user: Option<&str>,
        limit: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new()
            .opt("path", path)
            .opt("user", user)
            .opt("limit", limit);
        self.call("listPages", query, None, options)
    }

    /// `GET /pages.getPageTag`
    pub fn get_page_tag<T>(
        &self,
        page_id: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call(
            "getPageTag",
            Query::new().set("pageId", page_id),
            None,
            options,
        )
    }

    /// `GET /pages.updatePost`
    pub fn update_post<T>(
        &self,
        path: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("updatePost", Query::new().set("path", path), None, options)
    }

    /// `GET /comments.get`
    pub fn get_comments<T>(
        &self,
        page_id: &str,
        revision_id: Option<&str>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new()
            .set("page_id", page_id)
            .opt("revision_id", revision_id);
        self.call("getComments", query, None, options)
    }

    /// `POST /comments.add`
    pub fn add_comment<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("addComment", Query::new(), Some(body), options)
    }

    /// `POST /comments.update`
    pub fn update_comment<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("updateComment", Query::new(), Some(body), options)
    }

    /// `POST /comments.remove`
    pub fn remove_comment<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("removeComment", Query::new(), Some(body), options)
    }

    /// `GET /tags.search`
    pub fn search_tags<T>(
        &self,
        q: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("searchTags", Query::new().set("q", q), None, options)
    }

    /// `POST /tags.update`
    pub fn update_tag<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("updateTag", Query::new(), Some(body), options)
    }

    /// `GET /attachments.list`
    pub fn list_attachments<T>(
        &self,
        page_id: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call(
            "listAttachments",
            Query::new().set("page_id", page_id),
            None,
            options,
        )
    }

    /// `POST /attachments.remove`
    pub fn remove_attachment<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("removeAttachment", Query::new(), Some(body), options)
    }
}
