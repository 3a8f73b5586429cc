use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use tokio_util::sync::CancellationToken;

use crate::ClientError;
use crate::request::PreparedRequest;

/// Response envelope produced by a [`Transport`].
///
/// Executors only ever hand `body` back to callers.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Capability that actually puts a request on the wire.
///
/// Implementations must stop work and return [`ClientError::Cancelled`] when
/// `cancel` fires before the response settles.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn issue(
        &self,
        request: PreparedRequest,
        cancel: CancellationToken,
    ) -> Result<RawResponse, ClientError>;
}

/// Default [`Transport`] backed by `reqwest`.
///
/// Non-success statuses are reported as [`ClientError::HttpStatus`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Dispatches through an already configured `reqwest` client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn issue(
        &self,
        request: PreparedRequest,
        cancel: CancellationToken,
    ) -> Result<RawResponse, ClientError> {
        let url = build_url(&request)?;
        let mut builder = self
            .http
            .request(request.method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .headers(request.headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(json_body) = &request.body {
            builder = builder.json(json_body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await?;
            Ok::<_, ClientError>(RawResponse {
                status,
                headers,
                body,
            })
        };

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = exchange => response?,
        };

        if !response.status.is_success() {
            return Err(ClientError::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }
}

fn build_url(request: &PreparedRequest) -> Result<Url, ClientError> {
    let full = request.full_url();
    Url::parse(&full).map_err(|_| ClientError::InvalidUrl(full))
}
