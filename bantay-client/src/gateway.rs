//! Mutation gateway
//!
//! Every state-changing remote call goes through [`MutationGateway::run`]:
//! encode, dispatch, decode the `{ok}|{err}` union, and only then apply the
//! mutation's declared cache-invalidation set. Nothing throws past this
//! boundary; callers get one uniform failure shape. There is no optimistic
//! write state - after a confirmed ok the client re-fetches instead of
//! projecting the new state locally.

use crate::cache::{CacheKey, ReadCache};
use crate::error::Result;
use crate::remote::RemoteHandle;
use crate::wire::codec::decode_variant;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Uniform failure shape for mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    /// The remote service executed the call and rejected it. The message is
    /// the service's, verbatim; the UI displays it, never reinterprets it.
    #[error("{0}")]
    Rejected(String),

    /// The call could not complete or its result could not be decoded.
    #[error("request failed: {0}")]
    Transport(String),
}

pub type MutationResult<T> = std::result::Result<T, MutationFailure>;

pub struct MutationGateway {
    cache: Arc<ReadCache>,
}

impl MutationGateway {
    pub fn new(cache: Arc<ReadCache>) -> Self {
        Self { cache }
    }

    /// Run one mutation end to end.
    ///
    /// Invalidation is all-or-nothing: it happens only after the ok branch
    /// decoded cleanly, and never on rejection or fault.
    pub async fn run<T>(
        &self,
        handle: &RemoteHandle,
        method: &str,
        args: Value,
        invalidates: &[CacheKey],
        decode: impl FnOnce(&Value) -> Result<T>,
    ) -> MutationResult<T> {
        let raw = match handle.update(method, args).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(method, "mutation transport fault: {e}");
                return Err(MutationFailure::Transport(e.to_string()));
            }
        };

        let (tag, payload) = match decode_variant(&raw) {
            Ok(parts) => parts,
            Err(e) => return Err(MutationFailure::Transport(e.to_string())),
        };

        match tag {
            "ok" => {
                let value = decode(payload).map_err(|e| MutationFailure::Transport(e.to_string()))?;
                debug!(method, ?invalidates, "mutation confirmed");
                self.cache.invalidate(invalidates).await;
                Ok(value)
            }
            "err" => {
                let message = payload
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| payload.to_string());
                Err(MutationFailure::Rejected(message))
            }
            other => Err(MutationFailure::Transport(format!(
                "unexpected result tag {other:?}"
            ))),
        }
    }
}
