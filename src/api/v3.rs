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

/// GROWI REST API v3 (`/_api/v3`).
#[derive(Clone, Debug)]
pub struct ApiV3 {
    executor: RequestExecutor,
}

impl ApiV3 {
    pub(crate) fn new(executor: RequestExecutor) -> Self {
        debug_assert_eq!(executor.family(), ApiFamily::V3);
        Self { executor }
    }

    /// Surface that always talks to `handle`; instance names are ignored.
    pub fn from_handle(handle: ClientHandle) -> Self {
        Self::new(RequestExecutor::bound(ApiFamily::V3, handle))
    }

    /// Registry-backed surface that requires an instance name on every call.
    pub fn strict(registry: Arc<InstanceRegistry>) -> Self {
        Self::new(RequestExecutor::strict(ApiFamily::V3, registry))
    }

    /// Registry-backed surface that falls back to `default` when no
    /// instance name is given.
    pub fn with_default(registry: Arc<InstanceRegistry>, default: DefaultInstance) -> Self {
        let executor = RequestExecutor::with_default(ApiFamily::V3, registry, default);
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

    /// The v3 operation catalog.
    pub fn operations() -> &'static [OperationDefinition] {
        ApiFamily::V3.operations()
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
        path_params: &[(&str, &str)],
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
            path_params,
            query.into_pairs(),
            body,
            options,
        )
    }

    /// `GET /healthcheck`
    pub fn healthcheck<T>(&self, options: CallOptions) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("getHealthcheck", &[], Query::new(), None, options)
    }

    /// `GET /page`, by id or by path.
    pub fn get_page<T>(
        &self,
        page_id: Option<&str>,
        path: Option<&str>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new().opt("pageId", page_id).opt("path", path);
        self.call("getPage", &[], query, None, options)
    }

    /// `POST /page`
    pub fn create_page<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("createPage", &[], Query::new(), Some(body), options)
    }

    /// `PUT /page`
    pub fn update_page<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("updatePage", &[], Query::new(), Some(body), options)
    }

    /// `GET /page/info`
    pub fn get_page_info<T>(
        &self,
        page_id: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new().set("pageId", page_id);
        self.call("getPageInfo", &[], query, None, options)
    }

    /// `PUT /page/likes`
    pub fn like_page<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("likePage", &[], Query::new(), Some(body), options)
    }

    /// `GET /pages/recent`
    pub fn recent_pages<T>(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new().opt("limit", limit).opt("offset", offset);
        self.call("getRecentPages", &[], query, None, options)
    }

    /// `GET /pages/list`
    pub fn list_pages<T>(
        &self,
        path: &str,
        page: Option<u32>,
        limit: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new()
            .set("path", path)
            .opt("page", page)
            .opt("limit", limit);
        self.call("listPages", &[], query, None, options)
    }

    /// `PUT /pages/rename`
    pub fn rename_page<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("renamePage", &[], Query::new(), Some(body), options)
    }

    /// `POST /pages/delete`
    pub fn delete_pages<T>(
        &self,
        body: Value,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("deletePages", &[], Query::new(), Some(body), options)
    }

    /// `GET /revisions/list`
    pub fn list_revisions<T>(
        &self,
        page_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new()
            .set("pageId", page_id)
            .opt("page", page)
            .opt("limit", limit);
        self.call("listRevisions", &[], query, None, options)
    }

    /// `GET /revisions/{id}`
    pub fn get_revision<T>(
        &self,
        revision_id: &str,
        page_id: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new().set("pageId", page_id);
        self.call("getRevision", &[("id", revision_id)], query, None, options)
    }

    /// `GET /bookmarks/{userId}`
    pub fn get_bookmarks<T>(
        &self,
        user_id: &str,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call(
            "getBookmarks",
            &[("userId", user_id)],
            Query::new(),
            None,
            options,
        )
    }

    /// `GET /users/{id}/recent`
    pub fn user_recent_pages<T>(
        &self,
        user_id: &str,
        limit: Option<u32>,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = Query::new().opt("limit", limit);
        self.call("getUserPages", &[("id", user_id)], query, None, options)
    }

    /// `GET /personal-setting`
    pub fn personal_setting<T>(
        &self,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.call("getPersonalSetting", &[], Query::new(), None, options)
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
        self.call("searchPages", &[], query, None, options)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::{Value, json};

    use super::ApiV3;
    use crate::config::ClientConfiguration;
    use crate::executor::ApiFamily;
    use crate::handle::ClientHandle;
    use crate::registry::{DefaultInstance, InstanceRegistry};
    use crate::request::CallOptions;
    use crate::transport::testing::RecordingTransport;

    fn api(transport: Arc<RecordingTransport>) -> ApiV3 {
        let registry = Arc::new(InstanceRegistry::new());
        registry
            .register_with_transport(
                "siteA",
                &ClientConfiguration::new("https://a.example.com", "t1"),
                transport,
            )
            .expect("valid config");
        ApiV3::strict(registry)
    }

    #[tokio::test]
    async fn list_pages_sends_query_under_v3_prefix() {
        let transport = RecordingTransport::replying(r#"{"pages":[],"totalCount":0}"#);
        let body: Value = api(transport.clone())
            .list_pages("/Sandbox", Some(2), None, CallOptions::instance("siteA"))
            .expect("stub dispatches")
            .await
            .expect("request succeeds");

        assert_eq!(body["totalCount"], 0);
        let sent = transport.last();
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.full_url(), "https://a.example.com/_api/v3/pages/list");
        assert_eq!(
            sent.query,
            vec![
                ("path".to_owned(), "/Sandbox".to_owned()),
                ("page".to_owned(), "2".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn create_page_posts_json_body() {
        let transport = RecordingTransport::replying(r#"{"page":{"_id":"p1"}}"#);
        let body = json!({"path": "/Sandbox/new", "body": "# hello"});
        let _: Value = api(transport.clone())
            .create_page(body.clone(), CallOptions::instance("siteA"))
            .expect("stub dispatches")
            .await
            .expect("request succeeds");

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url, "/page");
        assert_eq!(sent.body, Some(body));
    }

    #[tokio::test]
    async fn get_revision_renders_path_param() {
        let transport = RecordingTransport::replying("{}");
        let _: Value = api(transport.clone())
            .get_revision("r1", "p1", CallOptions::instance("siteA"))
            .expect("stub dispatches")
            .await
            .expect("request succeeds");

        assert_eq!(transport.last().url, "/revisions/r1");
    }

    #[test]
    fn handle_surface_uses_v3_family() {
        let handle = ClientHandle::unauthenticated("", RecordingTransport::replying("{}"));
        let api = ApiV3::from_handle(handle);

        assert_eq!(api.executor().family(), ApiFamily::V3);
    }

    #[tokio::test]
    async fn fallback_surface_uses_default_instance() {
        let transport = RecordingTransport::replying(r#"{"status":"OK"}"#);
        let default = DefaultInstance::from_handle(ClientHandle::unauthenticated(
            "https://fallback.example.com",
            transport.clone(),
        ));
        let api = ApiV3::with_default(Arc::new(InstanceRegistry::new()), default);

        let body: Value = api
            .healthcheck(CallOptions::default())
            .expect("default instance resolves")
            .await
            .expect("request succeeds");

        assert_eq!(body["status"], "OK");
        assert_eq!(
            transport.last().full_url(),
            "https://fallback.example.com/_api/v3/healthcheck"
        );
    }

    #[test]
    fn unknown_operation_is_reported() {
        let transport = RecordingTransport::replying("{}");
        let result = api(transport).call_operation::<Value>(
            "noSuchOperation",
            &[],
            &[],
            None,
            CallOptions::instance("siteA"),
        );
        assert!(matches!(
            result,
            Err(crate::ClientError::UnknownOperation(_))
        ));
    }
}
