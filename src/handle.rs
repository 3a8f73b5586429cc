use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};

use crate::ClientError;
use crate::config::{ClientConfiguration, bearer, header_value};
use crate::transport::{ReqwestTransport, Transport};

/// Shared, mutable HTTP client configuration: base URL, default headers and
/// the transport requests go through.
///
/// Clones refer to the same underlying state. Base URL and headers are read
/// when a request is prepared, so a setter call affects only requests
/// prepared afterwards.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<HandleState>,
}

struct HandleState {
    base_url: RwLock<String>,
    headers: RwLock<HeaderMap>,
    transport: Arc<dyn Transport>,
}

impl ClientHandle {
    /// Builds a handle for `config` over a fresh `reqwest` transport.
    ///
    /// Sets `Authorization: Bearer <token>`, even for an empty token.
    pub fn new(config: &ClientConfiguration) -> Result<Self, ClientError> {
        Self::with_transport(config, Arc::new(ReqwestTransport::default()))
    }

    /// Same as [`ClientHandle::new`] but dispatching through `transport`.
    pub fn with_transport(
        config: &ClientConfiguration,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&config.authorization_header_value())?,
        );
        let base_url = config.base_url.clone();
        Ok(Self::from_parts(base_url, headers, transport))
    }

    /// Handle with a base URL and no default headers.
    pub fn unauthenticated(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(base_url.into(), HeaderMap::new(), transport)
    }

    pub(crate) fn from_parts(
        base_url: String,
        headers: HeaderMap,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleState {
                base_url: RwLock::new(base_url),
                headers: RwLock::new(headers),
                transport,
            }),
        }
    }

    /// Current base URL, without any API family suffix.
    pub fn base_url(&self) -> String {
        self.inner.base_url.read().clone()
    }

    /// Points later requests at `base_url`.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        *self.inner.base_url.write() = base_url.into();
    }

    /// Snapshot of the default headers.
    pub fn headers(&self) -> HeaderMap {
        self.inner.headers.read().clone()
    }

    /// Inserts or replaces one default header.
    pub fn set_header(&self, name: &str, value: &str) -> Result<(), ClientError> {
        let name =
            HeaderName::try_from(name).map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
        let value = header_value(value)?;
        self.inner.headers.write().insert(name, value);
        Ok(())
    }

    /// Replaces the `Authorization` header with `Bearer <token>`.
    pub fn set_authorization_token(&self, token: &str) -> Result<(), ClientError> {
        let value = header_value(&bearer(token))?;
        self.inner.headers.write().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Current `Authorization` header, if set and valid UTF-8.
    pub fn authorization(&self) -> Option<String> {
        self.inner
            .headers
            .read()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    /// Whether both handles share the same underlying state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Headers stay out of debug output; they carry the bearer token.
        f.debug_struct("ClientHandle")
            .field("base_url", &*self.inner.base_url.read())
            .field("transport", &self.inner.transport)
            .finish_non_exhaustive()
    }
}
