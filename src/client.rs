use std::sync::Arc;

use reqwest::header::AUTHORIZATION;

use crate::ClientError;
use crate::api::{ApiV1, ApiV3};
use crate::config::{ClientConfiguration, TransportOptions, header_value};
use crate::handle::ClientHandle;
use crate::transport::{ReqwestTransport, Transport};

/// Settings for one [`GrowiClient`].
#[derive(Clone, Debug, Default)]
pub struct GrowiClientConfig {
    pub base_url: String,
    pub token: String,
    pub transport: TransportOptions,
}

impl GrowiClientConfig {
    /// Settings for the site at `base_url` with default transport options.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            transport: TransportOptions::default(),
        }
    }

    /// Replaces the transport options.
    #[must_use]
    pub fn with_transport_options(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

impl From<ClientConfiguration> for GrowiClientConfig {
    fn from(config: ClientConfiguration) -> Self {
        Self::new(config.base_url, config.token)
    }
}

/// Client for one GROWI site, with ready-to-use v1 and v3 surfaces.
///
/// Each client owns a private [`ClientHandle`]; nothing is shared with other
/// clients, the global registry or the default instance. Both surfaces are
/// bound to that handle, so calls never need an instance name.
#[derive(Clone, Debug)]
pub struct GrowiClient {
    handle: ClientHandle,
    v1: ApiV1,
    v3: ApiV3,
}

impl GrowiClient {
    /// Builds a client with its own `reqwest` HTTP client.
    pub fn new(config: GrowiClientConfig) -> Result<Self, ClientError> {
        let http = config.transport.build_http_client()?;
        Self::with_transport(config, Arc::new(ReqwestTransport::new(http)))
    }

    /// Builds a client dispatching through `transport`.
    ///
    /// `config.transport` default headers still apply; the HTTP-level
    /// settings (timeout, user agent) are up to `transport`.
    pub fn with_transport(
        config: GrowiClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let identity = ClientConfiguration::new(config.base_url, config.token);
        let mut headers = config.transport.default_headers;
        headers.insert(
            AUTHORIZATION,
            header_value(&identity.authorization_header_value())?,
        );
        let handle = ClientHandle::from_parts(identity.base_url, headers, transport);
        tracing::debug!(base_url = %handle.base_url(), "created GROWI client");

        Ok(Self {
            v1: ApiV1::from_handle(handle.clone()),
            v3: ApiV3::from_handle(handle.clone()),
            handle,
        })
    }

    /// Reads the configuration from `GROWI_BASE_URL` and `GROWI_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfiguration::from_env().into())
    }

    /// Surface for `/_api`.
    pub fn v1(&self) -> &ApiV1 {
        &self.v1
    }

    /// Surface for `/_api/v3`.
    pub fn v3(&self) -> &ApiV3 {
        &self.v3
    }

    /// The handle this client dispatches through; the same one on every
    /// call.
    pub fn transport_handle(&self) -> &ClientHandle {
        &self.handle
    }
}
