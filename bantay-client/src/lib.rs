//! Bantay Client - Public-Budget Ledger SDK
//!
//! Client SDK for the Bantay public-budget tracking service. The service is
//! the single authority for all ledger state; this crate covers the full
//! client side of the conversation:
//!
//! - **Wire codec**: length-0/1 optionals, single-key tagged unions, big
//!   integers carried as number-or-string, nanosecond timestamps.
//! - **Remote handles**: network target resolution (local dev vs main),
//!   the local bootstrap handshake, and query/update dispatch.
//! - **Session**: `NoCredential -> Connecting -> {Connected, Error}`, with a
//!   full cache purge on every credential swap.
//! - **Read cache**: staleness-bounded aggregate reads (30 s) and
//!   always-fresh listings, with request-order-aware discard.
//! - **Mutation gateway**: `{ok}|{err}` result unions and declared
//!   invalidation sets, applied only after a confirmed ok.
//! - **Workflow models**: budget allocations, high-value approvals, and
//!   wallet-change requests with the seven-day cooldown.
//!
//! # Example
//!
//! ```rust,ignore
//! use bantay_client::{BantayClient, Config, Credential};
//!
//! let client = BantayClient::connect(&Config::from_env()).await?;
//! client.session().sign_in(Credential::new("…")).await;
//!
//! let metrics = client.system_metrics().await?;
//! let allocations = client.allocations().await?;
//! ```

// Operation catalogue
pub mod api;

// Read cache keyed by collection
pub mod cache;

// Environment-driven configuration
pub mod config;

// Error types
pub mod error;

// Mutation gateway
pub mod gateway;

// Paginated listings
pub mod page;

// Network targets, transports, remote handles
pub mod remote;

// Session lifecycle
pub mod session;

// Wire codec and record types
pub mod wire;

// Status machines and action affordances
pub mod workflow;

pub use api::BantayClient;
pub use cache::{CacheKey, ReadCache};
pub use config::{Config, DEFAULT_METRICS_STALE_MS};
pub use error::{ClientError, Result};
pub use gateway::{MutationFailure, MutationGateway, MutationResult};
pub use page::{Page, PageTracker};
pub use remote::{CallKind, Credential, NetworkTarget, RemoteHandle, Transport};
pub use session::{SessionController, SessionState};
pub use wire::records::{
    AuditEntry, BodyRollup, BudgetAllocation, CategoryShare, CivicBody, HighValueRequest,
    LedgerEvent, MonthlySpend, PublicBudgetSummary, PublicEvent, PublicTransaction,
    SecurityMetrics, ServiceMetrics, SystemMetrics, Transaction, Wallet, WalletChangeRequest,
};
pub use wire::{ActorId, Tokens};
pub use workflow::{
    allocation_actions, cooldown_status, high_value_actions, recovery_actions, AllocationAction,
    AllocationStatus, ApprovalAction, CooldownStatus, EventStatus, HighValueStatus,
    RecoveryStatus, TransactionStatus, WALLET_CHANGE_COOLDOWN_DAYS,
};

// Re-export the cache primitive for embedders building their own policies.
pub use bantay_cache_core::{CacheStats, StalenessCache};
