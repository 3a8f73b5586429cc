//! Rust client library for the GROWI wiki REST APIs.
//!
//! Public API layers:
//! - [`GrowiClient`]: one site, private configuration, `v1()` and `v3()`
//!   call-stub surfaces.
//! - [`InstanceRegistry`] + [`RequestExecutor`]: several named sites behind
//!   one set of stubs, selected per call through [`CallOptions`].
//! - [`CancellableRequest`]: what every stub returns; await it for the body
//!   or cancel it.
//! - [`ClientError`]: unified error type used by all of the above.
//!
//! v1 endpoints live under `<base>/_api`, v3 endpoints under
//! `<base>/_api/v3`.

pub mod api;
mod cancel;
mod client;
mod config;
mod error;
mod executor;
mod handle;
pub mod operations;
mod registry;
mod request;
mod transport;

pub use api::{ApiV1, ApiV3};
/// Cancellation primitives for in-flight requests.
pub use cancel::{CancelHandle, CancellableRequest};
/// Facade owning one site's configuration.
pub use client::{GrowiClient, GrowiClientConfig};
pub use config::{ACCESS_TOKEN_ENV, BASE_URL_ENV, ClientConfiguration, TransportOptions};
/// Error type returned by all client operations.
pub use error::ClientError;
pub use executor::{ApiFamily, MissingInstancePolicy, RequestExecutor};
pub use handle::ClientHandle;
pub use operations::OperationDefinition;
pub use registry::{DEFAULT_BASE_URL, DefaultInstance, InstanceRegistry};
pub use request::{CallOptions, PreparedRequest, RequestDescription, RequestOverrides};
pub use transport::{RawResponse, ReqwestTransport, Transport};
