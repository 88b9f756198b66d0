//! Remote interface factory
//!
//! Builds the credential-bound callable surface onto the remote ledger
//! service: network-target selection, the one-time local bootstrap handshake,
//! and the HTTP dispatch path. The handle is immutable once built; calls are
//! pure dispatches through it, so it is freely shared across concurrent
//! operations of one session.

use crate::config::Config;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Credentials
// ============================================================================

/// Opaque, externally issued proof of identity, held for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================================================
// Network target
// ============================================================================

/// Which deployment of the remote service to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkTarget {
    /// Local development service; requires the bootstrap handshake.
    Local { base_url: String },
    /// Production service.
    Main { base_url: String },
}

impl NetworkTarget {
    /// Resolve the target: the explicit network flag wins; otherwise a
    /// local-development apparent host selects the local target.
    pub fn resolve(config: &Config) -> Result<Self> {
        match config.network.as_deref() {
            Some("local") => Ok(Self::Local {
                base_url: config.local_url.clone(),
            }),
            Some("main") => Ok(Self::Main {
                base_url: config.main_url.clone(),
            }),
            Some(other) => Err(ClientError::Config(format!(
                "unknown network {other:?} (expected \"local\" or \"main\")"
            ))),
            None => {
                if is_local_dev_host(&config.apparent_host) {
                    Ok(Self::Local {
                        base_url: config.local_url.clone(),
                    })
                } else {
                    Ok(Self::Main {
                        base_url: config.main_url.clone(),
                    })
                }
            }
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            Self::Local { base_url } | Self::Main { base_url } => base_url,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Whether an apparent host names a local development environment.
pub fn is_local_dev_host(host: &str) -> bool {
    // Strip a port suffix. A bracketed IPv6 host keeps its brackets; more
    // than one colon without brackets is a bare IPv6 address, not host:port.
    let bare = if let Some(stripped) = host.strip_prefix('[') {
        stripped.split(']').next().unwrap_or(stripped)
    } else if host.matches(':').count() > 1 {
        host
    } else {
        host.rsplit_once(':').map_or(host, |(h, _)| h)
    };
    bare == "localhost" || bare == "127.0.0.1" || bare == "::1" || bare.ends_with(".localhost")
}

// ============================================================================
// Transport
// ============================================================================

/// Whether a remote operation is a read-only query or a state-changing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Update,
}

impl CallKind {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Update => "call",
        }
    }
}

/// Dispatch seam under the remote handle. Production uses HTTP; tests script
/// responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, kind: CallKind, method: &str, args: Value) -> Result<Value>;
}

/// HTTP transport. Timeouts and retries are the transport layer's own; no
/// additional policy is applied above it.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpTransport {
    pub fn new(http: reqwest::Client, base_url: String, credential: Option<Credential>) -> Self {
        Self {
            http,
            base_url,
            credential,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, kind: CallKind, method: &str, args: Value) -> Result<Value> {
        let url = format!(
            "{}/api/v1/{}/{}",
            self.base_url,
            kind.path_segment(),
            method
        );
        debug!(%url, "dispatching remote call");

        let mut request = self.http.post(&url).json(&json!({ "args": args }));
        if let Some(credential) = &self.credential {
            request = request.header("Authorization", format!("Bearer {}", credential.expose()));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!("HTTP {status} - {body}")));
        }

        Ok(response.json().await?)
    }
}

// ============================================================================
// Remote handle
// ============================================================================

/// Credential-bound callable surface onto the remote service.
///
/// Recreated whenever the credential changes; never shared across
/// credentials; dropped on sign-out.
pub struct RemoteHandle {
    transport: Arc<dyn Transport>,
    anonymous: bool,
}

impl RemoteHandle {
    /// Build a handle for the given target and credential.
    ///
    /// For a local target this performs the one-time bootstrap handshake (a
    /// fetch of the service's root trust artifact). Handshake failure is
    /// logged and non-fatal; subsequent calls may fail instead.
    pub async fn build(target: NetworkTarget, credential: Option<Credential>) -> Result<Self> {
        let http = reqwest::Client::new();

        if target.is_local() {
            match bootstrap_handshake(&http, target.base_url()).await {
                Ok(()) => info!(base_url = target.base_url(), "bootstrap handshake complete"),
                Err(e) => warn!(
                    base_url = target.base_url(),
                    "bootstrap handshake failed, continuing anyway: {e}"
                ),
            }
        }

        let anonymous = credential.is_none();
        let transport = Arc::new(HttpTransport::new(
            http,
            target.base_url().to_string(),
            credential,
        ));
        Ok(Self {
            transport,
            anonymous,
        })
    }

    /// Assemble a handle from a prebuilt transport. Used by tests and by
    /// embedders with their own dispatch path.
    pub fn from_parts(transport: Arc<dyn Transport>, anonymous: bool) -> Self {
        Self {
            transport,
            anonymous,
        }
    }

    pub async fn query(&self, method: &str, args: Value) -> Result<Value> {
        self.transport.dispatch(CallKind::Query, method, args).await
    }

    pub async fn update(&self, method: &str, args: Value) -> Result<Value> {
        self.transport.dispatch(CallKind::Update, method, args).await
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

/// Fetch the root trust artifact from a local development service.
async fn bootstrap_handshake(http: &reqwest::Client, base_url: &str) -> Result<()> {
    let url = format!("{base_url}/api/v1/root-key");
    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(ClientError::Transport(format!(
            "root trust artifact fetch returned HTTP {}",
            response.status().as_u16()
        )));
    }
    // The artifact only needs to be received; verification is the transport
    // stack's concern.
    let _ = response.bytes().await?;
    Ok(())
}
