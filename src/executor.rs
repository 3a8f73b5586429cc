//! The single funnel every call stub dispatches through.
//!
//! An executor picks a [`ClientHandle`], computes the effective base URL for
//! its API family, merges per-call overrides and hands the request to the
//! handle's transport. Resolution problems are reported by
//! [`RequestExecutor::execute`] itself, before anything touches the network;
//! transport problems surface when the returned [`CancellableRequest`] is
//! awaited.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ClientError;
use crate::cancel::{CancelHandle, CancellableRequest};
use crate::handle::ClientHandle;
use crate::registry::{DefaultInstance, InstanceRegistry};
use crate::request::{CallOptions, PreparedRequest, RequestDescription};

/// GROWI API generation a request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    V1,
    V3,
}

impl ApiFamily {
    /// Path appended to every effective base URL of this family.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::V1 => "/_api",
            Self::V3 => "/_api/v3",
        }
    }

    /// Short name used on the command line and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiFamily {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v3" | "3" => Ok(Self::V3),
            other => Err(format!("unknown API family '{other}' (expected v1 or v3)")),
        }
    }
}

/// What a registry-backed executor does when no instance name is supplied.
#[derive(Clone, Debug, Default)]
pub enum MissingInstancePolicy {
    /// Fail with [`ClientError::MissingParameter`].
    #[default]
    Reject,
    /// Dispatch through the given default instance.
    UseDefault(DefaultInstance),
}

#[derive(Clone, Debug)]
enum Target {
    Bound(ClientHandle),
    Registry {
        registry: Arc<InstanceRegistry>,
        policy: MissingInstancePolicy,
    },
}

/// Dispatches call-stub requests for one [`ApiFamily`].
#[derive(Clone, Debug)]
pub struct RequestExecutor {
    family: ApiFamily,
    target: Target,
}

impl RequestExecutor {
    /// Executor that always uses `handle`; `CallOptions::instance_name` is
    /// ignored.
    pub fn bound(family: ApiFamily, handle: ClientHandle) -> Self {
        Self {
            family,
            target: Target::Bound(handle),
        }
    }

    /// Registry-backed executor that requires an instance name on every call.
    pub fn strict(family: ApiFamily, registry: Arc<InstanceRegistry>) -> Self {
        Self::with_policy(family, registry, MissingInstancePolicy::Reject)
    }

    /// Registry-backed executor that falls back to `default` when no
    /// instance name is given.
    pub fn with_default(
        family: ApiFamily,
        registry: Arc<InstanceRegistry>,
        default: DefaultInstance,
    ) -> Self {
        Self::with_policy(family, registry, MissingInstancePolicy::UseDefault(default))
    }

    /// Registry-backed executor with an explicit [`MissingInstancePolicy`].
    pub fn with_policy(
        family: ApiFamily,
        registry: Arc<InstanceRegistry>,
        policy: MissingInstancePolicy,
    ) -> Self {
        Self {
            family,
            target: Target::Registry { registry, policy },
        }
    }

    /// Strict executor over [`InstanceRegistry::global`].
    pub fn global(family: ApiFamily) -> Self {
        Self::strict(family, InstanceRegistry::global())
    }

    /// The family whose suffix this executor appends.
    pub fn family(&self) -> ApiFamily {
        self.family
    }

    /// Dispatches `request` and returns a pending, cancellable body.
    ///
    /// Fails immediately with [`ClientError::InstanceNotFound`] or
    /// [`ClientError::MissingParameter`] when no handle can be resolved.
    pub fn execute<T>(
        &self,
        request: RequestDescription,
        options: CallOptions,
    ) -> Result<CancellableRequest<T>, ClientError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let handle = self.resolve_handle(options.instance_name.as_deref())?;
        let prepared = self.prepare(&handle, request, options);
        tracing::debug!(
            family = %self.family,
            method = %prepared.method,
            url = %prepared.full_url(),
            "dispatching request"
        );

        let cancel = CancelHandle::new();
        let token = cancel.token();
        let transport = handle.transport();
        let future = async move {
            let response = transport.issue(prepared, token).await?;
            decode_body(&response.body)
        };

        Ok(CancellableRequest::new(Box::pin(future), cancel))
    }

    fn resolve_handle(&self, instance_name: Option<&str>) -> Result<ClientHandle, ClientError> {
        match &self.target {
            Target::Bound(handle) => Ok(handle.clone()),
            Target::Registry { registry, policy } => match (instance_name, policy) {
                (Some(name), _) => registry.resolve(name),
                (None, MissingInstancePolicy::UseDefault(default)) => Ok(default.handle().clone()),
                (None, MissingInstancePolicy::Reject) => {
                    tracing::warn!(
                        family = %self.family,
                        "request issued without an instance name"
                    );
                    Err(ClientError::MissingParameter("instance_name"))
                }
            },
        }
    }

    /// Merges overrides and fixes the effective base URL:
    /// override, then request, then handle, then empty, plus the family
    /// suffix.
    fn prepare(
        &self,
        handle: &ClientHandle,
        request: RequestDescription,
        options: CallOptions,
    ) -> PreparedRequest {
        let merged = match options.overrides {
            Some(overrides) => request.merge(overrides),
            None => request,
        };

        let base = merged.base_url.unwrap_or_else(|| handle.base_url());
        let mut headers = handle.headers();
        if let Some(own) = merged.headers {
            headers.extend(own);
        }

        PreparedRequest {
            method: merged.method,
            base_url: format!("{base}{}", self.family.suffix()),
            url: merged.url,
            headers,
            query: merged.query,
            body: merged.body,
            timeout: merged.timeout,
        }
    }
}

fn decode_body<T: DeserializeOwned>(payload: &str) -> Result<T, ClientError> {
    if payload.trim().is_empty() {
        Ok(serde_json::from_value(Value::Null)?)
    } else {
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::header::AUTHORIZATION;
    use serde_json::{Value, json};

    use super::{ApiFamily, RequestExecutor};
    use crate::ClientError;
    use crate::config::ClientConfiguration;
    use crate::handle::ClientHandle;
    use crate::registry::{DefaultInstance, InstanceRegistry};
    use crate::request::{CallOptions, RequestDescription, RequestOverrides};
    use crate::transport::testing::RecordingTransport;

    fn registry_with(
        name: &str,
        base_url: &str,
        token: &str,
        transport: Arc<RecordingTransport>,
    ) -> Arc<InstanceRegistry> {
        let registry = Arc::new(InstanceRegistry::new());
        registry
            .register_with_transport(name, &ClientConfiguration::new(base_url, token), transport)
            .expect("valid config");
        registry
    }

    #[tokio::test]
    async fn named_instance_gets_family_suffix_and_bearer_header() {
        let transport = RecordingTransport::replying(r#"{"pages":[]}"#);
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V3, registry);

        let body: Value = executor
            .execute(
                RequestDescription::get("/pages"),
                CallOptions::instance("siteA"),
            )
            .expect("instance resolves")
            .await
            .expect("request succeeds");

        assert_eq!(body, json!({"pages": []}));
        let sent = transport.last();
        assert_eq!(sent.base_url, "https://a.example.com/_api/v3");
        assert_eq!(sent.url, "/pages");
        assert_eq!(sent.headers[AUTHORIZATION], "Bearer t1");
    }

    #[test]
    fn strict_executor_rejects_missing_instance_before_dispatch() {
        let transport = RecordingTransport::replying("{}");
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V1, registry);

        let error = executor
            .execute::<Value>(RequestDescription::get("/search"), CallOptions::default())
            .expect_err("instance name is required");

        assert!(matches!(
            error,
            ClientError::MissingParameter("instance_name")
        ));
        assert_eq!(transport.count(), 0);
    }

    #[test]
    fn unknown_instance_fails_before_dispatch() {
        let transport = RecordingTransport::replying("{}");
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V3, registry);

        let error = executor
            .execute::<Value>(
                RequestDescription::get("/pages"),
                CallOptions::instance("siteB"),
            )
            .expect_err("siteB is not registered");

        assert!(matches!(error, ClientError::InstanceNotFound(name) if name == "siteB"));
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn override_base_url_wins_over_request_and_instance() {
        let transport = RecordingTransport::replying("{}");
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V3, registry);

        let options = CallOptions::instance("siteA")
            .with_overrides(RequestOverrides::default().base_url("https://override.example.com"));
        let request = RequestDescription::get("/pages").base_url("https://request.example.com");
        let _: Value = executor
            .execute(request, options)
            .expect("instance resolves")
            .await
            .expect("request succeeds");

        assert_eq!(
            transport.last().base_url,
            "https://override.example.com/_api/v3"
        );
    }

    #[tokio::test]
    async fn request_base_url_wins_over_instance() {
        let transport = RecordingTransport::replying("{}");
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V1, registry);

        let request = RequestDescription::get("/search").base_url("https://request.example.com");
        let _: Value = executor
            .execute(request, CallOptions::instance("siteA"))
            .expect("instance resolves")
            .await
            .expect("request succeeds");

        assert_eq!(
            transport.last().base_url,
            "https://request.example.com/_api"
        );
    }

    #[tokio::test]
    async fn empty_base_url_yields_bare_suffix() {
        for (family, expected) in [(ApiFamily::V1, "/_api"), (ApiFamily::V3, "/_api/v3")] {
            let transport = RecordingTransport::replying("");
            let handle =
                ClientHandle::with_transport(&ClientConfiguration::new("", ""), transport.clone())
                    .expect("valid config");
            let executor = RequestExecutor::bound(family, handle);

            let body: Value = executor
                .execute(
                    RequestDescription::get("/healthcheck"),
                    CallOptions::default(),
                )
                .expect("bound executor resolves")
                .await
                .expect("request succeeds");

            assert_eq!(body, Value::Null);
            assert_eq!(transport.last().base_url, expected);
        }
    }

    #[tokio::test]
    async fn explicit_empty_override_is_not_skipped() {
        let transport = RecordingTransport::replying("{}");
        let registry = registry_with("siteA", "https://a.example.com", "t1", transport.clone());
        let executor = RequestExecutor::strict(ApiFamily::V3, registry);

        let options =
            CallOptions::instance("siteA").with_overrides(RequestOverrides::default().base_url(""));
        let _: Value = executor
            .execute(RequestDescription::get("/pages"), options)
            .expect("instance resolves")
            .await
            .expect("request succeeds");

        assert_eq!(transport.last().base_url, "/_api/v3");
    }

    #[tokio::test]
    async fn fallback_policy_uses_default_instance() {
        let transport = RecordingTransport::replying("{}");
        let default = DefaultInstance::from_handle(ClientHandle::unauthenticated(
            "http://localhost",
            transport.clone(),
        ));
        let executor = RequestExecutor::with_default(
            ApiFamily::V1,
            Arc::new(InstanceRegistry::new()),
            default.clone(),
        );

        default.set_base_url("https://default.example.com");
        let _: Value = executor
            .execute(
                RequestDescription::get("/pages.list"),
                CallOptions::default(),
            )
            .expect("default resolves")
            .await
            .expect("request succeeds");

        let sent = transport.last();
        assert_eq!(sent.base_url, "https://default.example.com/_api");
        assert!(!sent.headers.contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn request_headers_overlay_handle_defaults() {
        let transport = RecordingTransport::replying("{}");
        let handle = ClientHandle::with_transport(
            &ClientConfiguration::new("https://a.example.com", "t1"),
            transport.clone(),
        )
        .expect("valid config");
        let executor = RequestExecutor::bound(ApiFamily::V3, handle);

        let request = RequestDescription::get("/pages")
            .header("x-request", "base")
            .expect("valid header");
        let options = CallOptions::default().with_overrides(
            RequestOverrides::default()
                .header("x-override", "1")
                .expect("valid header"),
        );
        let _: Value = executor
            .execute(request, options)
            .expect("bound executor resolves")
            .await
            .expect("request succeeds");

        let sent = transport.last();
        assert_eq!(sent.headers[AUTHORIZATION], "Bearer t1");
        assert_eq!(sent.headers["x-override"], "1");
        assert!(!sent.headers.contains_key("x-request"));
    }

    #[tokio::test]
    async fn cancel_signals_transport_once() {
        let transport = RecordingTransport::hanging();
        let handle = ClientHandle::with_transport(
            &ClientConfiguration::new("https://a.example.com", "t1"),
            transport.clone(),
        )
        .expect("valid config");
        let executor = RequestExecutor::bound(ApiFamily::V3, handle);

        let pending = executor
            .execute::<Value>(RequestDescription::get("/pages"), CallOptions::default())
            .expect("bound executor resolves");
        let remote = pending.cancel_handle();
        let task = tokio::spawn(pending);

        tokio::task::yield_now().await;
        assert!(remote.cancel());
        assert!(!remote.cancel());

        let result = task.await.expect("task joins");
        assert!(matches!(result, Err(ClientError::Cancelled)));
        assert_eq!(*transport.cancellations.lock(), 1);
    }

    #[tokio::test]
    async fn cancelling_one_request_leaves_siblings_alone() {
        let transport = RecordingTransport::replying(r#"{"ok":true}"#);
        let handle = ClientHandle::with_transport(
            &ClientConfiguration::new("https://a.example.com", "t1"),
            transport.clone(),
        )
        .expect("valid config");
        let executor = RequestExecutor::bound(ApiFamily::V3, handle);

        let first = executor
            .execute::<Value>(RequestDescription::get("/a"), CallOptions::default())
            .expect("resolves");
        let second = executor
            .execute::<Value>(RequestDescription::get("/b"), CallOptions::default())
            .expect("resolves");

        assert!(first.cancel());
        assert_eq!(second.await.expect("sibling succeeds"), json!({"ok": true}));
    }
}
