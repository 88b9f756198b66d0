//! State-changing catalogue operations.
//!
//! Every method runs through the mutation gateway and declares its cache
//! invalidation set inline. Nothing here projects post-mutation state
//! locally; callers re-fetch the affected listings after a confirmed ok.

use crate::api::BantayClient;
use crate::cache::CacheKey;
use crate::gateway::{MutationFailure, MutationResult};
use crate::remote::RemoteHandle;
use crate::wire::codec::{encode_opt, wire_nat, Tokens};
use crate::wire::records::{
    BudgetAllocation, CivicBody, HighValueRequest, LedgerEvent, Transaction, Wallet,
    WalletChangeRequest,
};
use crate::workflow::{cooldown_status, EventStatus};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

impl BantayClient {
    async fn mutator(&self) -> MutationResult<Arc<RemoteHandle>> {
        self.authed()
            .await
            .map_err(|e| MutationFailure::Transport(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub async fn record_transaction(
        &self,
        from_address: &str,
        to_address: &str,
        amount: Tokens,
        memo: Option<String>,
    ) -> MutationResult<Transaction> {
        let handle = self.mutator().await?;
        let args = json!({
            "from_address": from_address,
            "to_address": to_address,
            "amount": amount.to_wire(),
            "memo": encode_opt(memo.map(Value::String)),
        });
        self.gateway()
            .run(
                &handle,
                "record_transaction",
                args,
                &[CacheKey::Transactions, CacheKey::SystemMetrics],
                Transaction::from_wire,
            )
            .await
    }

    pub async fn confirm_transaction(&self, id: &str) -> MutationResult<Transaction> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "confirm_transaction",
                json!({"id": id}),
                &[CacheKey::Transactions, CacheKey::SystemMetrics],
                Transaction::from_wire,
            )
            .await
    }

    pub async fn fail_transaction(&self, id: &str, reason: &str) -> MutationResult<Transaction> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "fail_transaction",
                json!({"id": id, "reason": reason}),
                &[CacheKey::Transactions, CacheKey::SystemMetrics],
                Transaction::from_wire,
            )
            .await
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    pub async fn create_wallet(
        &self,
        label: &str,
        civic_body: Option<String>,
    ) -> MutationResult<Wallet> {
        let handle = self.mutator().await?;
        let args = json!({
            "label": label,
            "civic_body": encode_opt(civic_body.map(Value::String)),
        });
        self.gateway()
            .run(&handle, "create_wallet", args, &[CacheKey::Wallets], Wallet::from_wire)
            .await
    }

    // ------------------------------------------------------------------
    // Budget allocations
    // ------------------------------------------------------------------

    pub async fn create_allocation(
        &self,
        category: &str,
        civic_body: Option<String>,
        period: &str,
        amount: Tokens,
        fiscal_year: u32,
        description: Option<String>,
    ) -> MutationResult<BudgetAllocation> {
        let handle = self.mutator().await?;
        let args = json!({
            "category": category,
            "civic_body": encode_opt(civic_body.map(Value::String)),
            "period": period,
            "amount": amount.to_wire(),
            "fiscal_year": fiscal_year,
            "description": encode_opt(description.map(Value::String)),
        });
        self.gateway()
            .run(
                &handle,
                "create_allocation",
                args,
                &[
                    CacheKey::Allocations,
                    CacheKey::SystemMetrics,
                    CacheKey::CategoryDistribution,
                ],
                BudgetAllocation::from_wire,
            )
            .await
    }

    pub async fn approve_allocation(&self, id: &str) -> MutationResult<BudgetAllocation> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "approve_allocation",
                json!({"id": id}),
                &[CacheKey::Allocations],
                BudgetAllocation::from_wire,
            )
            .await
    }

    pub async fn cancel_allocation(&self, id: &str) -> MutationResult<BudgetAllocation> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "cancel_allocation",
                json!({"id": id}),
                &[CacheKey::Allocations],
                BudgetAllocation::from_wire,
            )
            .await
    }

    /// Close every open allocation of a fiscal period. The ok branch carries
    /// the number of allocations closed.
    pub async fn close_period(&self, period: &str, fiscal_year: u32) -> MutationResult<u64> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "close_period",
                json!({"period": period, "fiscal_year": fiscal_year}),
                &[CacheKey::Allocations, CacheKey::SystemMetrics],
                |v| {
                    let raw = wire_nat(v)?;
                    u64::try_from(raw).map_err(|_| {
                        crate::error::ClientError::Protocol("closed count out of range".into())
                    })
                },
            )
            .await
    }

    /// Roll the unspent remainder of an expired allocation into a new draft
    /// for the target fiscal year/period. The original allocation's status
    /// is remote-authoritative and unchanged by this client.
    pub async fn rollover_allocation(
        &self,
        id: &str,
        target_fiscal_year: u32,
        target_period: &str,
    ) -> MutationResult<BudgetAllocation> {
        let handle = self.mutator().await?;
        let args = json!({
            "id": id,
            "target_fiscal_year": target_fiscal_year,
            "target_period": target_period,
        });
        self.gateway()
            .run(&handle, "rollover_allocation", args, &[CacheKey::Allocations], BudgetAllocation::from_wire)
            .await
    }

    pub async fn distribute_allocation(
        &self,
        id: &str,
        to_address: &str,
        amount: Tokens,
    ) -> MutationResult<Transaction> {
        let handle = self.mutator().await?;
        let args = json!({
            "id": id,
            "to_address": to_address,
            "amount": amount.to_wire(),
        });
        self.gateway()
            .run(
                &handle,
                "distribute_allocation",
                args,
                &[
                    CacheKey::Allocations,
                    CacheKey::Transactions,
                    CacheKey::SystemMetrics,
                ],
                Transaction::from_wire,
            )
            .await
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub async fn create_event(
        &self,
        name: &str,
        civic_body: Option<String>,
        budget: Tokens,
        starts_at: DateTime<Utc>,
    ) -> MutationResult<LedgerEvent> {
        let handle = self.mutator().await?;
        let args = json!({
            "name": name,
            "civic_body": encode_opt(civic_body.map(Value::String)),
            "budget": budget.to_wire(),
            "starts_at": crate::wire::codec::nanos_from_instant(starts_at).to_string(),
        });
        self.gateway()
            .run(&handle, "create_event", args, &[CacheKey::Events], LedgerEvent::from_wire)
            .await
    }

    pub async fn update_event_status(
        &self,
        id: &str,
        status: EventStatus,
    ) -> MutationResult<LedgerEvent> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "update_event_status",
                json!({"id": id, "status": status.to_wire()}),
                &[CacheKey::Events],
                LedgerEvent::from_wire,
            )
            .await
    }

    pub async fn record_event_expense(
        &self,
        id: &str,
        amount: Tokens,
        memo: Option<String>,
    ) -> MutationResult<LedgerEvent> {
        let handle = self.mutator().await?;
        let args = json!({
            "id": id,
            "amount": amount.to_wire(),
            "memo": encode_opt(memo.map(Value::String)),
        });
        self.gateway()
            .run(
                &handle,
                "record_event_expense",
                args,
                &[CacheKey::Events, CacheKey::Allocations, CacheKey::SystemMetrics],
                LedgerEvent::from_wire,
            )
            .await
    }

    // ------------------------------------------------------------------
    // Civic bodies
    // ------------------------------------------------------------------

    pub async fn register_civic_body(&self, name: &str, region: &str) -> MutationResult<CivicBody> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "register_civic_body",
                json!({"name": name, "region": region}),
                &[CacheKey::CivicBodies],
                CivicBody::from_wire,
            )
            .await
    }

    pub async fn update_civic_body(
        &self,
        id: &str,
        name: &str,
        region: &str,
    ) -> MutationResult<CivicBody> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "update_civic_body",
                json!({"id": id, "name": name, "region": region}),
                &[CacheKey::CivicBodies],
                CivicBody::from_wire,
            )
            .await
    }

    pub async fn link_wallet(&self, body_id: &str, address: &str) -> MutationResult<CivicBody> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "link_wallet",
                json!({"id": body_id, "address": address}),
                &[CacheKey::CivicBodies, CacheKey::Wallets],
                CivicBody::from_wire,
            )
            .await
    }

    // ------------------------------------------------------------------
    // High-value approval
    // ------------------------------------------------------------------

    pub async fn approve_high_value(&self, id: &str) -> MutationResult<HighValueRequest> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "approve_high_value",
                json!({"id": id}),
                &[CacheKey::HighValue],
                HighValueRequest::from_wire,
            )
            .await
    }

    pub async fn reject_high_value(
        &self,
        id: &str,
        reason: &str,
    ) -> MutationResult<HighValueRequest> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "reject_high_value",
                json!({"id": id, "reason": reason}),
                &[CacheKey::HighValue],
                HighValueRequest::from_wire,
            )
            .await
    }

    pub async fn set_high_value_threshold(&self, amount: Tokens) -> MutationResult<Tokens> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "set_high_value_threshold",
                json!({"amount": amount.to_wire()}),
                &[CacheKey::SecurityMetrics],
                Tokens::from_wire,
            )
            .await
    }

    // ------------------------------------------------------------------
    // Wallet recovery
    // ------------------------------------------------------------------

    /// Submit a wallet-change request for a civic body, with the client-side
    /// cooldown guard layered on top of remote enforcement. Inside the
    /// window, no remote call is issued.
    pub async fn request_wallet_change(
        &self,
        body: &CivicBody,
        new_address: &str,
        reason: &str,
    ) -> MutationResult<WalletChangeRequest> {
        self.request_wallet_change_at(body, new_address, reason, Utc::now())
            .await
    }

    /// As [`Self::request_wallet_change`], with "now" injected.
    pub async fn request_wallet_change_at(
        &self,
        body: &CivicBody,
        new_address: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> MutationResult<WalletChangeRequest> {
        let cooldown = cooldown_status(body.last_wallet_change, now);
        if cooldown.active {
            let days = cooldown.remaining.num_days();
            let hours = cooldown.remaining.num_hours() % 24;
            return Err(MutationFailure::Rejected(format!(
                "wallet change cooldown active for {}: {days} days {hours} hours remaining",
                body.name
            )));
        }

        let handle = self.mutator().await?;
        let args = json!({
            "civic_body": body.id,
            "new_address": new_address,
            "reason": reason,
        });
        self.gateway()
            .run(
                &handle,
                "request_wallet_change",
                args,
                &[CacheKey::Recovery],
                WalletChangeRequest::from_wire,
            )
            .await
    }

    pub async fn approve_wallet_change(&self, id: &str) -> MutationResult<WalletChangeRequest> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "approve_wallet_change",
                json!({"id": id}),
                &[CacheKey::Recovery, CacheKey::CivicBodies, CacheKey::Wallets],
                WalletChangeRequest::from_wire,
            )
            .await
    }

    pub async fn reject_wallet_change(
        &self,
        id: &str,
        reason: &str,
    ) -> MutationResult<WalletChangeRequest> {
        let handle = self.mutator().await?;
        self.gateway()
            .run(
                &handle,
                "reject_wallet_change",
                json!({"id": id, "reason": reason}),
                &[CacheKey::Recovery],
                WalletChangeRequest::from_wire,
            )
            .await
    }
}
