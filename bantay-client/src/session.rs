//! Session controller
//!
//! Owns the remote handle's lifecycle keyed to the current credential:
//! `NoCredential -> Connecting -> {Connected, Error}`. A credential swap
//! fully tears down the previous handle and purges every cached collection
//! before anything under the new credential may resolve; a completion from a
//! superseded generation is discarded, never written.

use crate::cache::{CacheKey, ReadCache};
use crate::remote::{Credential, NetworkTarget, RemoteHandle};
use crate::error::{ClientError, Result};
use crate::wire::codec::ActorId;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Observable session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoCredential,
    Connecting,
    Connected { actor: ActorId },
    Error { message: String },
}

/// Controller for one credential-bound session.
///
/// The raw handle is never exposed for ad-hoc mutation; catalogue code
/// borrows it through [`SessionController::handle`].
pub struct SessionController {
    target: NetworkTarget,
    state: RwLock<SessionState>,
    handle: RwLock<Option<Arc<RemoteHandle>>>,
    cache: Arc<ReadCache>,
    generation: AtomicU64,
}

impl SessionController {
    pub fn new(target: NetworkTarget, cache: Arc<ReadCache>) -> Self {
        Self {
            target,
            state: RwLock::new(SessionState::NoCredential),
            handle: RwLock::new(None),
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Build a handle for `credential` and bring the session up.
    pub async fn sign_in(&self, credential: Credential) -> SessionState {
        let generation = self.begin(SessionState::Connecting).await;
        match RemoteHandle::build(self.target.clone(), Some(credential)).await {
            Ok(handle) => self.finish_connect(generation, Arc::new(handle)).await,
            Err(e) => {
                self.fail(generation, format!("could not reach the service: {e}"))
                    .await
            }
        }
    }

    /// Bring the session up on an already-built handle. Used by embedders
    /// with their own transport and by tests.
    pub async fn attach(&self, handle: Arc<RemoteHandle>) -> SessionState {
        let generation = self.begin(SessionState::Connecting).await;
        self.finish_connect(generation, handle).await
    }

    /// Drop the credential: tear down the handle, purge every cached
    /// collection, return to `NoCredential`.
    pub async fn sign_out(&self) {
        self.begin(SessionState::NoCredential).await;
        info!("session closed");
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current_actor(&self) -> Option<ActorId> {
        match &*self.state.read().await {
            SessionState::Connected { actor } => Some(actor.clone()),
            _ => None,
        }
    }

    pub async fn is_live(&self) -> bool {
        matches!(&*self.state.read().await, SessionState::Connected { .. })
    }

    /// The current credential-bound handle, for catalogue dispatch.
    pub(crate) async fn handle(&self) -> Result<Arc<RemoteHandle>> {
        self.handle
            .read()
            .await
            .clone()
            .ok_or_else(|| ClientError::NoSession("sign in first".to_string()))
    }

    /// Start a new generation: invalidate the old handle and all cached
    /// collections, then publish `next` as the visible state.
    async fn begin(&self, next: SessionState) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.handle.write().await = None;
        self.cache.clear().await;
        *self.state.write().await = next;
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn finish_connect(&self, generation: u64, handle: Arc<RemoteHandle>) -> SessionState {
        // Liveness probe first; a dead service never becomes Connected.
        let alive = match handle.query("liveness", Value::Null).await {
            Ok(v) => v.as_bool().unwrap_or(false),
            Err(e) => {
                return self
                    .fail(generation, format!("liveness probe failed: {e}"))
                    .await
            }
        };
        if !alive {
            return self
                .fail(generation, "service reported itself unavailable".to_string())
                .await;
        }

        // A swap during the probe means this connect is already superseded;
        // bail before the warm-up can touch the new generation's cache. A
        // swap during the warm-up itself is caught by the cache epoch.
        if !self.is_current(generation) {
            return self.state().await;
        }

        // Warm up: caller identity and the initial aggregate read, fanned out.
        let whoami = handle.query("whoami", Value::Null);
        let metrics_handle = handle.clone();
        let metrics = self.cache.force_refresh(CacheKey::SystemMetrics, move || async move {
            metrics_handle.query("get_system_metrics", Value::Null).await
        });

        let (who, _) = match tokio::try_join!(whoami, metrics) {
            Ok(results) => results,
            Err(e) => {
                return self
                    .fail(generation, format!("session warm-up failed: {e}"))
                    .await
            }
        };

        let actor = match ActorId::from_wire(&who) {
            Ok(actor) => actor,
            Err(e) => return self.fail(generation, e.to_string()).await,
        };

        // A newer sign-in or sign-out superseded this one; discard quietly.
        if !self.is_current(generation) {
            return self.state().await;
        }

        *self.handle.write().await = Some(handle);
        let state = SessionState::Connected { actor: actor.clone() };
        *self.state.write().await = state.clone();
        info!(%actor, "session connected");
        state
    }

    async fn fail(&self, generation: u64, message: String) -> SessionState {
        if self.is_current(generation) {
            warn!("session error: {message}");
            *self.state.write().await = SessionState::Error {
                message: message.clone(),
            };
            SessionState::Error { message }
        } else {
            self.state().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{CallKind, Transport};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    /// Scripted service: answers the session's three warm-up calls.
    struct Script {
        actor: &'static str,
        alive: bool,
        /// When set, the liveness answer waits until notified.
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Transport for Script {
        async fn dispatch(&self, _kind: CallKind, method: &str, _args: Value) -> Result<Value> {
            match method {
                "liveness" => {
                    if let Some(gate) = &self.gate {
                        gate.notified().await;
                    }
                    Ok(json!(self.alive))
                }
                "whoami" => Ok(json!(self.actor)),
                "get_system_metrics" => Ok(json!({"actor": self.actor, "total": 9})),
                other => Err(ClientError::Transport(format!("unscripted method {other}"))),
            }
        }
    }

    fn scripted(actor: &'static str) -> Arc<RemoteHandle> {
        Arc::new(RemoteHandle::from_parts(
            Arc::new(Script {
                actor,
                alive: true,
                gate: None,
            }),
            false,
        ))
    }

    fn controller() -> (Arc<ReadCache>, SessionController) {
        let cache = Arc::new(ReadCache::new());
        let target = NetworkTarget::Main {
            base_url: "https://ledger.test".into(),
        };
        (cache.clone(), SessionController::new(target, cache))
    }

    #[tokio::test]
    async fn connect_probes_then_warms_up() {
        let (cache, session) = controller();

        let state = session.attach(scripted("principal-a")).await;

        assert_eq!(
            state,
            SessionState::Connected {
                actor: ActorId("principal-a".into())
            }
        );
        assert!(session.is_live().await);
        assert_eq!(session.current_actor().await, Some(ActorId("principal-a".into())));
        // The initial aggregate read landed in the cache.
        assert_eq!(
            cache.peek(CacheKey::SystemMetrics).await,
            Some(json!({"actor": "principal-a", "total": 9}))
        );
    }

    #[tokio::test]
    async fn false_liveness_yields_error_state() {
        let (_, session) = controller();
        let handle = Arc::new(RemoteHandle::from_parts(
            Arc::new(Script {
                actor: "x",
                alive: false,
                gate: None,
            }),
            false,
        ));

        let state = session.attach(handle).await;
        match state {
            SessionState::Error { message } => {
                assert!(message.contains("unavailable"), "{message}");
            }
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(session.handle().await.is_err());
    }

    #[tokio::test]
    async fn probe_fault_yields_error_state() {
        struct Dead;

        #[async_trait]
        impl Transport for Dead {
            async fn dispatch(&self, _: CallKind, _: &str, _: Value) -> Result<Value> {
                Err(ClientError::Transport("connection refused".into()))
            }
        }

        let (_, session) = controller();
        let state = session
            .attach(Arc::new(RemoteHandle::from_parts(Arc::new(Dead), false)))
            .await;

        match state {
            SessionState::Error { message } => {
                assert!(message.contains("liveness probe failed"), "{message}");
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_out_tears_down_and_purges() {
        let (cache, session) = controller();
        session.attach(scripted("principal-a")).await;

        session.sign_out().await;

        assert_eq!(session.state().await, SessionState::NoCredential);
        assert!(session.handle().await.is_err());
        assert_eq!(cache.peek(CacheKey::SystemMetrics).await, None);
    }

    #[tokio::test]
    async fn credential_swap_purges_before_new_reads_resolve() {
        let (cache, session) = controller();
        session.attach(scripted("principal-a")).await;
        assert_eq!(
            cache.peek(CacheKey::SystemMetrics).await,
            Some(json!({"actor": "principal-a", "total": 9}))
        );

        session.attach(scripted("principal-b")).await;

        // Nothing fetched under the old credential survives the swap.
        assert_eq!(
            cache.peek(CacheKey::SystemMetrics).await,
            Some(json!({"actor": "principal-b", "total": 9}))
        );
        assert_eq!(session.current_actor().await, Some(ActorId("principal-b".into())));
    }

    #[tokio::test]
    async fn superseded_sign_in_is_discarded() {
        let (cache, session) = controller();
        let session = Arc::new(session);
        let gate = Arc::new(Notify::new());

        let slow = Arc::new(RemoteHandle::from_parts(
            Arc::new(Script {
                actor: "slow-principal",
                alive: true,
                gate: Some(gate.clone()),
            }),
            false,
        ));

        let racer = {
            let session = session.clone();
            tokio::spawn(async move { session.attach(slow).await })
        };
        tokio::task::yield_now().await;

        // A second sign-in supersedes the gated one.
        session.attach(scripted("principal-b")).await;
        gate.notify_waiters();
        racer.await.unwrap();

        assert_eq!(
            session.current_actor().await,
            Some(ActorId("principal-b".into()))
        );
        // The slow attach's warm-up must not have overwritten the cache.
        assert_eq!(
            cache.peek(CacheKey::SystemMetrics).await,
            Some(json!({"actor": "principal-b", "total": 9}))
        );
    }
}
