//! Workflow models
//!
//! Client-observed mirrors of the three remote workflows: budget-allocation
//! lifecycle, high-value multi-signature approval, and wallet-change
//! recovery. Status enumerations are closed and their wire tags verbatim.
//!
//! Everything here is advisory UI gating. The remote service is the sole
//! authority and may reject an action the client believed was legal; that
//! surfaces through the mutation gateway as a rejection, and recovery is an
//! explicit re-fetch, never an automatic retry.

use crate::error::{ClientError, Result};
use crate::wire::codec::{decode_variant, encode_variant, ActorId, Tokens};
use crate::wire::records::{BudgetAllocation, HighValueRequest, WalletChangeRequest};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wallet-change cooldown window.
pub const WALLET_CHANGE_COOLDOWN_DAYS: i64 = 7;

// ============================================================================
// Status enumerations
// ============================================================================

macro_rules! wire_status {
    ($(#[$doc:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn tag(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }

            pub fn from_wire(v: &Value) -> Result<Self> {
                let (tag, _) = decode_variant(v)?;
                match tag {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    other => Err(ClientError::Protocol(format!(
                        concat!("unknown ", stringify!($name), " tag {:?}"),
                        other
                    ))),
                }
            }

            pub fn to_wire(self) -> Value {
                encode_variant(self.tag(), Value::Null)
            }
        }
    };
}

wire_status! {
    /// Budget-allocation lifecycle status.
    AllocationStatus { Draft, Approved, Released, FullySpent, Expired, Cancelled }
}

wire_status! {
    /// High-value approval request status.
    HighValueStatus { PendingApproval, Approved, Rejected, Expired }
}

wire_status! {
    /// Wallet-change recovery request status.
    RecoveryStatus { PendingApproval, Approved, Rejected }
}

wire_status! {
    /// Ledger transaction status.
    TransactionStatus { Pending, Confirmed, Failed }
}

wire_status! {
    /// Community event status.
    EventStatus { Planned, Ongoing, Completed, Cancelled }
}

// ============================================================================
// Affordances
// ============================================================================

/// Status actions the UI may offer for a budget allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationAction {
    Approve,
    Cancel,
    Distribute,
    /// Carries the unspent remainder eligible for rollover.
    Rollover { remaining: Tokens },
}

/// Derive the legal status actions for an allocation from its status alone.
///
/// Over-spend (`spent > allocated`) renders as zero remaining rather than
/// panicking; the client never enforces the remote invariant.
pub fn allocation_actions(a: &BudgetAllocation) -> Vec<AllocationAction> {
    match a.status {
        AllocationStatus::Draft => vec![AllocationAction::Approve, AllocationAction::Cancel],
        AllocationStatus::Approved => {
            vec![AllocationAction::Distribute, AllocationAction::Cancel]
        }
        AllocationStatus::Released | AllocationStatus::FullySpent => vec![],
        AllocationStatus::Expired => {
            let remaining = a.allocated.saturating_sub(a.spent);
            if remaining.is_zero() {
                vec![]
            } else {
                vec![AllocationAction::Rollover { remaining }]
            }
        }
        AllocationStatus::Cancelled => vec![],
    }
}

/// Actions for pending approval-style requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Reject,
}

/// Actions `caller` may take on a high-value request.
///
/// A principal who has already approved is not offered Approve again.
/// `approvals` reaching the required count is expected to transition the
/// status remotely on a later observation; the client does not synthesize it.
pub fn high_value_actions(r: &HighValueRequest, caller: &ActorId) -> Vec<ApprovalAction> {
    match r.status {
        HighValueStatus::PendingApproval => {
            let mut actions = Vec::new();
            if !r.approvals.contains(caller) {
                actions.push(ApprovalAction::Approve);
            }
            actions.push(ApprovalAction::Reject);
            actions
        }
        _ => vec![],
    }
}

/// Actions available on a wallet-change request.
pub fn recovery_actions(r: &WalletChangeRequest) -> Vec<ApprovalAction> {
    match r.status {
        RecoveryStatus::PendingApproval => vec![ApprovalAction::Approve, ApprovalAction::Reject],
        _ => vec![],
    }
}

// ============================================================================
// Cooldown
// ============================================================================

/// Result of the wallet-change cooldown check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownStatus {
    pub active: bool,
    /// Time left until a new request is allowed; zero when inactive.
    pub remaining: Duration,
}

/// Pure cooldown check for a civic body's wallet.
///
/// `last_change` of `None` (the body never changed wallets) means no
/// cooldown. "Now" is injected so tests run without a live clock.
pub fn cooldown_status(last_change: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CooldownStatus {
    let Some(last) = last_change else {
        return CooldownStatus {
            active: false,
            remaining: Duration::zero(),
        };
    };
    let ends = last + Duration::days(WALLET_CHANGE_COOLDOWN_DAYS);
    if now < ends {
        CooldownStatus {
            active: true,
            remaining: ends - now,
        }
    } else {
        CooldownStatus {
            active: false,
            remaining: Duration::zero(),
        }
    }
}
