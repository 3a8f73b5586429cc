use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::ClientError;
use crate::config::ClientConfiguration;
use crate::handle::ClientHandle;
use crate::transport::{ReqwestTransport, Transport};

/// Base URL of the process-wide default instance until it is reconfigured.
pub const DEFAULT_BASE_URL: &str = "http://localhost";

static GLOBAL_REGISTRY: LazyLock<Arc<InstanceRegistry>> =
    LazyLock::new(|| Arc::new(InstanceRegistry::new()));

static DEFAULT_INSTANCE: LazyLock<DefaultInstance> = LazyLock::new(DefaultInstance::new);

/// Named client handles for talking to several GROWI sites at once.
///
/// Registering an existing name replaces its handle. Entries are never
/// removed implicitly.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: RwLock<HashMap<String, ClientHandle>>,
}

impl InstanceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Creates (or replaces) the handle bound to `name` and returns it.
    pub fn register(
        &self,
        name: impl Into<String>,
        config: &ClientConfiguration,
    ) -> Result<ClientHandle, ClientError> {
        let handle = ClientHandle::new(config)?;
        self.register_handle(name, handle.clone());
        Ok(handle)
    }

    /// Like [`InstanceRegistry::register`] with a caller-supplied transport.
    pub fn register_with_transport(
        &self,
        name: impl Into<String>,
        config: &ClientConfiguration,
        transport: Arc<dyn Transport>,
    ) -> Result<ClientHandle, ClientError> {
        let handle = ClientHandle::with_transport(config, transport)?;
        self.register_handle(name, handle.clone());
        Ok(handle)
    }

    /// Binds an existing handle to `name`, replacing any previous binding.
    pub fn register_handle(&self, name: impl Into<String>, handle: ClientHandle) {
        let name = name.into();
        tracing::debug!(
            instance = %name,
            base_url = %handle.base_url(),
            "registering client instance"
        );
        self.instances.write().insert(name, handle);
    }

    /// Looks up the handle registered under `name`.
    ///
    /// Fails with [`ClientError::InstanceNotFound`]; there is no fallback to
    /// the default instance.
    pub fn resolve(&self, name: &str) -> Result<ClientHandle, ClientError> {
        self.instances.read().get(name).cloned().ok_or_else(|| {
            tracing::warn!(instance = %name, "no client instance registered");
            ClientError::InstanceNotFound(name.to_owned())
        })
    }
}

/// The implicit client used by executors that fall back when no instance
/// name is given.
///
/// Starts at [`DEFAULT_BASE_URL`] with no `Authorization` header.
#[derive(Clone, Debug)]
pub struct DefaultInstance {
    handle: ClientHandle,
}

impl DefaultInstance {
    /// A fresh unauthenticated instance at [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::from_handle(ClientHandle::unauthenticated(
            DEFAULT_BASE_URL,
            Arc::new(ReqwestTransport::default()),
        ))
    }

    /// Wraps an existing handle.
    pub fn from_handle(handle: ClientHandle) -> Self {
        Self { handle }
    }

    /// The default instance shared by the whole process.
    pub fn global() -> Self {
        DEFAULT_INSTANCE.clone()
    }

    /// The shared handle behind this instance.
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Points later fallback requests at `base_url`.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        self.handle.set_base_url(base_url);
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn set_authorization_header(&self, token: &str) -> Result<(), ClientError> {
        self.handle.set_authorization_token(token)
    }
}

impl Default for DefaultInstance {
    fn default() -> Self {
        Self::new()
    }
}
