use thiserror::Error;

/// Errors returned by instance resolution and request dispatch.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No instance was registered under the requested name.
    #[error("no client instance registered under name '{0}'")]
    InstanceNotFound(String),

    /// A strict executor was called without a required parameter.
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    /// A header name or value (usually the bearer token) is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Effective base URL and request path do not form an absolute URL.
    #[error("invalid request URL '{0}'")]
    InvalidUrl(String),

    /// The requested `OpenAPI` operation id is not present in the catalog.
    #[error("unknown OpenAPI operation '{0}'")]
    UnknownOperation(String),

    /// A required path template parameter was not provided.
    #[error("missing required path parameter '{parameter}' for operation '{operation_id}'")]
    MissingPathParameter {
        operation_id: String,
        parameter: String,
    },

    /// The request was cancelled through its cancel handle before it settled.
    #[error("query cancelled")]
    Cancelled,

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be decoded into the requested type.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status with response payload.
    #[error("server returned status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}
