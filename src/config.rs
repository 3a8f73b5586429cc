use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Environment variable holding the GROWI base URL.
pub const BASE_URL_ENV: &str = "GROWI_BASE_URL";
/// Environment variable holding the GROWI access token.
pub const ACCESS_TOKEN_ENV: &str = "GROWI_ACCESS_TOKEN";

/// Identity of one GROWI endpoint: where it lives and which token to send.
///
/// Both fields may be empty. An empty `base_url` produces path-only request
/// bases such as `/_api/v3`; an empty `token` still produces the
/// `Authorization: Bearer ` header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfiguration {
    #[serde(default, alias = "baseURL")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

impl ClientConfiguration {
    /// Configuration for the site at `base_url`, authenticated with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Reads `GROWI_BASE_URL` and `GROWI_ACCESS_TOKEN`, defaulting each to
    /// the empty string when unset.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV).unwrap_or_default(),
            token: std::env::var(ACCESS_TOKEN_ENV).unwrap_or_default(),
        }
    }

    /// Value of the `Authorization` header, `Bearer <token>`.
    pub fn authorization_header_value(&self) -> String {
        bearer(&self.token)
    }
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub(crate) fn header_value(raw: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(raw).map_err(|e| ClientError::InvalidHeader(e.to_string()))
}

/// Overrides applied to the HTTP client a [`crate::GrowiClient`] builds for
/// itself.
#[derive(Clone, Debug, Default)]
pub struct TransportOptions {
    /// Whole-request timeout applied by the underlying client.
    pub timeout: Option<Duration>,
    /// `User-Agent` sent with every request.
    pub user_agent: Option<String>,
    /// Headers sent with every request, below the `Authorization` header.
    pub default_headers: HeaderMap,
}

impl TransportOptions {
    /// Sets the whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a default header.
    pub fn with_default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ClientError> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
        self.default_headers
            .insert(name, header_value(value.as_ref())?);
        Ok(self)
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(builder.build()?)
    }
}
