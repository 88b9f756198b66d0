//! Typed wire records
//!
//! One decoder per record shape in the remote catalogue. Decoding happens
//! exactly once, at this boundary; downstream code only ever sees the native
//! structs. A malformed item anywhere in a listing aborts the whole decode
//! (see [`crate::wire::codec::decode_list`]).

use crate::error::Result;
use crate::wire::codec::{
    actor_field, decode_list, field, instant_field, opt_actor_field, opt_instant_field,
    opt_str_field, str_field, tokens_field, u32_field, u64_field, ActorId, Tokens,
};
use crate::workflow::{
    AllocationStatus, EventStatus, HighValueStatus, RecoveryStatus, TransactionStatus,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

// ============================================================================
// Workflow entities
// ============================================================================

/// A budget allocation as observed from the remote ledger.
///
/// `spent <= allocated` is expected but not locally enforced; over-spend must
/// render without crashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetAllocation {
    pub id: String,
    pub category: String,
    /// Owning civic body, if the allocation is body-scoped.
    pub civic_body: Option<String>,
    pub period: String,
    pub allocated: Tokens,
    pub spent: Tokens,
    pub fiscal_year: u32,
    pub description: Option<String>,
    pub status: AllocationStatus,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetAllocation {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            category: str_field(v, "category")?,
            civic_body: opt_str_field(v, "civic_body")?,
            period: str_field(v, "period")?,
            allocated: tokens_field(v, "allocated")?,
            spent: tokens_field(v, "spent")?,
            fiscal_year: u32_field(v, "fiscal_year")?,
            description: opt_str_field(v, "description")?,
            status: AllocationStatus::from_wire(field(v, "status")?)?,
            created_by: actor_field(v, "created_by")?,
            created_at: instant_field(v, "created_at")?,
            updated_at: instant_field(v, "updated_at")?,
        })
    }

    /// Unspent remainder, saturating on over-spend.
    pub fn remaining(&self) -> Tokens {
        self.allocated.saturating_sub(self.spent)
    }
}

/// A high-value disbursement awaiting multi-signature approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighValueRequest {
    pub id: String,
    pub allocation_id: String,
    pub requested_by: ActorId,
    pub amount: Tokens,
    pub from_address: String,
    pub to_address: String,
    pub reason: String,
    pub status: HighValueStatus,
    pub approvals: Vec<ActorId>,
    pub required_approvals: u32,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<ActorId>,
    pub rejection_reason: Option<String>,
}

impl HighValueRequest {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            allocation_id: str_field(v, "allocation_id")?,
            requested_by: actor_field(v, "requested_by")?,
            amount: tokens_field(v, "amount")?,
            from_address: str_field(v, "from_address")?,
            to_address: str_field(v, "to_address")?,
            reason: str_field(v, "reason")?,
            status: HighValueStatus::from_wire(field(v, "status")?)?,
            approvals: decode_list(field(v, "approvals")?, ActorId::from_wire)?,
            required_approvals: u32_field(v, "required_approvals")?,
            created_at: instant_field(v, "created_at")?,
            resolved_at: opt_instant_field(v, "resolved_at")?,
            rejected_by: opt_actor_field(v, "rejected_by")?,
            rejection_reason: opt_str_field(v, "rejection_reason")?,
        })
    }
}

/// A wallet-change (recovery) request for a civic body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletChangeRequest {
    pub id: String,
    pub civic_body: String,
    pub previous_address: Option<String>,
    pub new_address: String,
    pub requested_by: ActorId,
    pub reason: String,
    pub status: RecoveryStatus,
    pub approved_by: Option<ActorId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl WalletChangeRequest {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            civic_body: str_field(v, "civic_body")?,
            previous_address: opt_str_field(v, "previous_address")?,
            new_address: str_field(v, "new_address")?,
            requested_by: actor_field(v, "requested_by")?,
            reason: str_field(v, "reason")?,
            status: RecoveryStatus::from_wire(field(v, "status")?)?,
            approved_by: opt_actor_field(v, "approved_by")?,
            created_at: instant_field(v, "created_at")?,
            resolved_at: opt_instant_field(v, "resolved_at")?,
        })
    }
}

// ============================================================================
// Ledger collections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: Tokens,
    pub status: TransactionStatus,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            from_address: str_field(v, "from_address")?,
            to_address: str_field(v, "to_address")?,
            amount: tokens_field(v, "amount")?,
            status: TransactionStatus::from_wire(field(v, "status")?)?,
            memo: opt_str_field(v, "memo")?,
            created_at: instant_field(v, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub address: String,
    pub owner: ActorId,
    pub label: String,
    pub balance: Tokens,
    pub civic_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            address: str_field(v, "address")?,
            owner: actor_field(v, "owner")?,
            label: str_field(v, "label")?,
            balance: tokens_field(v, "balance")?,
            civic_body: opt_str_field(v, "civic_body")?,
            created_at: instant_field(v, "created_at")?,
        })
    }
}

/// The barangay-equivalent administrative unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivicBody {
    pub id: String,
    pub name: String,
    pub region: String,
    pub wallet_address: Option<String>,
    /// Instant of the last approved wallet change; drives the client-side
    /// cooldown guard.
    pub last_wallet_change: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CivicBody {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            name: str_field(v, "name")?,
            region: str_field(v, "region")?,
            wallet_address: opt_str_field(v, "wallet_address")?,
            last_wallet_change: opt_instant_field(v, "last_wallet_change")?,
            registered_at: instant_field(v, "registered_at")?,
            updated_at: instant_field(v, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub id: String,
    pub name: String,
    pub civic_body: Option<String>,
    pub budget: Tokens,
    pub spent: Tokens,
    pub status: EventStatus,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEvent {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            name: str_field(v, "name")?,
            civic_body: opt_str_field(v, "civic_body")?,
            budget: tokens_field(v, "budget")?,
            spent: tokens_field(v, "spent")?,
            status: EventStatus::from_wire(field(v, "status")?)?,
            starts_at: instant_field(v, "starts_at")?,
            created_at: instant_field(v, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub actor: ActorId,
    pub action: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            id: str_field(v, "id")?,
            actor: actor_field(v, "actor")?,
            action: str_field(v, "action")?,
            detail: str_field(v, "detail")?,
            at: instant_field(v, "at")?,
        })
    }
}

// ============================================================================
// Aggregates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMetrics {
    pub total_allocated: Tokens,
    pub total_spent: Tokens,
    pub transaction_count: u64,
    pub wallet_count: u64,
    pub civic_body_count: u64,
}

impl SystemMetrics {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            total_allocated: tokens_field(v, "total_allocated")?,
            total_spent: tokens_field(v, "total_spent")?,
            transaction_count: u64_field(v, "transaction_count")?,
            wallet_count: u64_field(v, "wallet_count")?,
            civic_body_count: u64_field(v, "civic_body_count")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityMetrics {
    pub high_value_threshold: Tokens,
    pub pending_high_value: u64,
    pub pending_recoveries: u64,
}

impl SecurityMetrics {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            high_value_threshold: tokens_field(v, "high_value_threshold")?,
            pending_high_value: u64_field(v, "pending_high_value")?,
            pending_recoveries: u64_field(v, "pending_recoveries")?,
        })
    }
}

/// Host-side runtime metrics of the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMetrics {
    pub uptime_secs: u64,
    pub memory_bytes: u64,
    pub call_count: u64,
}

impl ServiceMetrics {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            uptime_secs: u64_field(v, "uptime_secs")?,
            memory_bytes: u64_field(v, "memory_bytes")?,
            call_count: u64_field(v, "call_count")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: String,
    pub allocated: Tokens,
    pub spent: Tokens,
}

impl CategoryShare {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            category: str_field(v, "category")?,
            allocated: tokens_field(v, "allocated")?,
            spent: tokens_field(v, "spent")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySpend {
    /// Calendar month in `YYYY-MM` form.
    pub month: String,
    pub total: Tokens,
}

impl MonthlySpend {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            month: str_field(v, "month")?,
            total: tokens_field(v, "total")?,
        })
    }
}

// ============================================================================
// Public (credential-free) shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicBudgetSummary {
    pub fiscal_year: u32,
    pub total_allocated: Tokens,
    pub total_spent: Tokens,
    pub categories: Vec<CategoryShare>,
}

impl PublicBudgetSummary {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            fiscal_year: u32_field(v, "fiscal_year")?,
            total_allocated: tokens_field(v, "total_allocated")?,
            total_spent: tokens_field(v, "total_spent")?,
            categories: decode_list(field(v, "categories")?, CategoryShare::from_wire)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicEvent {
    pub name: String,
    pub civic_body: Option<String>,
    pub budget: Tokens,
    pub spent: Tokens,
    pub status: EventStatus,
}

impl PublicEvent {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            name: str_field(v, "name")?,
            civic_body: opt_str_field(v, "civic_body")?,
            budget: tokens_field(v, "budget")?,
            spent: tokens_field(v, "spent")?,
            status: EventStatus::from_wire(field(v, "status")?)?,
        })
    }
}

/// Pre-aggregated public transaction view; no addresses or actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicTransaction {
    pub amount: Tokens,
    pub category: Option<String>,
    pub at: DateTime<Utc>,
}

impl PublicTransaction {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            amount: tokens_field(v, "amount")?,
            category: opt_str_field(v, "category")?,
            at: instant_field(v, "at")?,
        })
    }
}

/// Per-body wallet rollup for the public dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRollup {
    pub body_name: String,
    pub wallet_address: Option<String>,
    pub received: Tokens,
    pub spent: Tokens,
}

impl BodyRollup {
    pub fn from_wire(v: &Value) -> Result<Self> {
        Ok(Self {
            body_name: str_field(v, "body_name")?,
            wallet_address: opt_str_field(v, "wallet_address")?,
            received: tokens_field(v, "received")?,
            spent: tokens_field(v, "spent")?,
        })
    }
}
