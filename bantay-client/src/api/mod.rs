//! Remote operation catalogue
//!
//! [`BantayClient`] composes the session controller, read cache, and
//! mutation gateway, and exposes one method per remote operation. Queries go
//! through the cache (listings with a zero window, aggregates with the
//! 30-second window); updates go through the gateway with a declared
//! invalidation set; the public surface dispatches on a credential-free
//! handle.

mod mutations;
mod public;
mod queries;

use crate::cache::{CacheKey, ReadCache};
use crate::config::Config;
use crate::error::Result;
use crate::gateway::MutationGateway;
use crate::remote::{NetworkTarget, RemoteHandle};
use crate::session::SessionController;
use serde_json::Value;
use std::sync::Arc;

/// Client for the Bantay public-budget ledger service.
pub struct BantayClient {
    session: Arc<SessionController>,
    cache: Arc<ReadCache>,
    gateway: MutationGateway,
    /// Anonymous handle for the credential-free public surface.
    public: Arc<RemoteHandle>,
}

impl BantayClient {
    /// Resolve the network target from `config` and build the client. The
    /// session starts without a credential; call
    /// [`SessionController::sign_in`] to authenticate.
    pub async fn connect(config: &Config) -> Result<Self> {
        let target = NetworkTarget::resolve(config)?;
        let public = Arc::new(RemoteHandle::build(target.clone(), None).await?);
        Ok(Self::from_parts(target, public))
    }

    /// Assemble a client around an existing anonymous handle. Used by tests
    /// and embedders with their own transports.
    pub fn from_parts(target: NetworkTarget, public: Arc<RemoteHandle>) -> Self {
        let cache = Arc::new(ReadCache::new());
        let session = Arc::new(SessionController::new(target, cache.clone()));
        let gateway = MutationGateway::new(cache.clone());
        Self {
            session,
            cache,
            gateway,
            public,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// The anonymous handle behind the public surface. Embedders can attach
    /// it to the session for credential-free browsing of the read catalogue.
    pub fn public_handle(&self) -> Arc<RemoteHandle> {
        self.public.clone()
    }

    pub(crate) async fn authed(&self) -> Result<Arc<RemoteHandle>> {
        self.session.handle().await
    }

    /// Cached argument-free query under `key`'s default staleness window.
    pub(crate) async fn cached_query(&self, key: CacheKey, method: &'static str) -> Result<Value> {
        let handle = self.authed().await?;
        self.cache
            .get_or_fetch(key, key.stale_ms(), move || async move {
                handle.query(method, Value::Null).await
            })
            .await
    }

    /// Parameterized query, dispatched directly (parameterized listings are
    /// not cached; the per-collection slots hold only the unfiltered reads).
    pub(crate) async fn direct_query(&self, method: &str, args: Value) -> Result<Value> {
        self.authed().await?.query(method, args).await
    }

    pub(crate) fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }
}
