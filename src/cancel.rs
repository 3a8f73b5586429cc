//! Cancellable pending results returned by every call stub.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio_util::sync::CancellationToken;

use crate::ClientError;

type BoxedResult<T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send>>;

/// Cancels one in-flight request.
///
/// Clones share state, so any clone may cancel. Only the first call to
/// [`CancelHandle::cancel`] signals the token.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Creates a fresh handle with its own token.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Token the transport watches.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Requests cancellation. Returns `true` only for the call that actually
    /// signalled the token.
    pub fn cancel(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::debug!("cancelling in-flight request");
        self.token.cancel();
        true
    }

    /// Whether the token has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A pending API call resolving to its decoded response body.
///
/// Await it for the body; call [`CancellableRequest::cancel`] to ask the
/// transport to abort. Cancellation is cooperative: a request the server
/// already processed is not undone, and cancelling a settled request does
/// nothing.
#[must_use = "requests do nothing unless awaited"]
pub struct CancellableRequest<T> {
    future: BoxedResult<T>,
    handle: CancelHandle,
}

impl<T> CancellableRequest<T> {
    pub(crate) fn new(future: BoxedResult<T>, handle: CancelHandle) -> Self {
        Self { future, handle }
    }

    /// See [`CancelHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// Handle that can cancel this request from elsewhere, for example
    /// another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }
}

impl<T> Future for CancellableRequest<T> {
    type Output = Result<T, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for CancellableRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellableRequest")
            .field("cancelled", &self.handle.is_cancelled())
            .finish_non_exhaustive()
    }
}
