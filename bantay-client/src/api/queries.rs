//! Read-only catalogue operations.

use crate::api::BantayClient;
use crate::cache::CacheKey;
use crate::error::Result;
use crate::page::Page;
use crate::wire::codec::{decode_list, ActorId};
use crate::wire::records::{
    AuditEntry, BudgetAllocation, CategoryShare, CivicBody, HighValueRequest, LedgerEvent,
    MonthlySpend, SecurityMetrics, ServiceMetrics, SystemMetrics, Transaction, Wallet,
    WalletChangeRequest,
};
use crate::workflow::TransactionStatus;
use serde_json::{json, Value};

impl BantayClient {
    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Liveness probe, on the anonymous handle. Uncached; truthy means the
    /// service answers.
    pub async fn liveness(&self) -> Result<bool> {
        let raw = self.public.query("liveness", Value::Null).await?;
        Ok(raw.as_bool().unwrap_or(false))
    }

    /// The caller's own identity descriptor.
    pub async fn whoami(&self) -> Result<ActorId> {
        let raw = self.direct_query("whoami", Value::Null).await?;
        ActorId::from_wire(&raw)
    }

    // ------------------------------------------------------------------
    // Aggregates (30 s staleness window)
    // ------------------------------------------------------------------

    pub async fn system_metrics(&self) -> Result<SystemMetrics> {
        let raw = self
            .cached_query(CacheKey::SystemMetrics, "get_system_metrics")
            .await?;
        SystemMetrics::from_wire(&raw)
    }

    pub async fn security_metrics(&self) -> Result<SecurityMetrics> {
        let raw = self
            .cached_query(CacheKey::SecurityMetrics, "get_security_metrics")
            .await?;
        SecurityMetrics::from_wire(&raw)
    }

    pub async fn service_metrics(&self) -> Result<ServiceMetrics> {
        let raw = self
            .cached_query(CacheKey::ServiceMetrics, "get_service_metrics")
            .await?;
        ServiceMetrics::from_wire(&raw)
    }

    /// All three aggregates fanned out concurrently, for the dashboard's
    /// initial render. Each leg still goes through its own cache slot.
    pub async fn metrics_overview(
        &self,
    ) -> Result<(SystemMetrics, SecurityMetrics, ServiceMetrics)> {
        futures::try_join!(
            self.system_metrics(),
            self.security_metrics(),
            self.service_metrics(),
        )
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        let raw = self
            .cached_query(CacheKey::Transactions, "list_transactions")
            .await?;
        decode_list(&raw, Transaction::from_wire)
    }

    pub async fn transactions_page(&self, page: u32, limit: u32) -> Result<Page<Transaction>> {
        let raw = self
            .direct_query("list_transactions_page", json!({"page": page, "limit": limit}))
            .await?;
        Page::from_wire(&raw, Transaction::from_wire)
    }

    pub async fn transactions_by_address(&self, address: &str) -> Result<Vec<Transaction>> {
        let raw = self
            .direct_query("list_transactions_by_address", json!({"address": address}))
            .await?;
        decode_list(&raw, Transaction::from_wire)
    }

    pub async fn transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>> {
        let raw = self
            .direct_query("list_transactions_by_status", json!({"status": status.to_wire()}))
            .await?;
        decode_list(&raw, Transaction::from_wire)
    }

    // ------------------------------------------------------------------
    // Wallets
    // ------------------------------------------------------------------

    pub async fn own_wallets(&self) -> Result<Vec<Wallet>> {
        let raw = self.direct_query("list_own_wallets", Value::Null).await?;
        decode_list(&raw, Wallet::from_wire)
    }

    pub async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        let raw = self.cached_query(CacheKey::Wallets, "list_wallets").await?;
        decode_list(&raw, Wallet::from_wire)
    }

    // ------------------------------------------------------------------
    // Budget
    // ------------------------------------------------------------------

    pub async fn allocations(&self) -> Result<Vec<BudgetAllocation>> {
        let raw = self
            .cached_query(CacheKey::Allocations, "list_allocations")
            .await?;
        decode_list(&raw, BudgetAllocation::from_wire)
    }

    pub async fn category_distribution(&self) -> Result<Vec<CategoryShare>> {
        let raw = self
            .cached_query(CacheKey::CategoryDistribution, "get_category_distribution")
            .await?;
        decode_list(&raw, CategoryShare::from_wire)
    }

    pub async fn monthly_expenditure(&self) -> Result<Vec<MonthlySpend>> {
        let raw = self
            .cached_query(CacheKey::MonthlyExpenditure, "get_monthly_expenditure")
            .await?;
        decode_list(&raw, MonthlySpend::from_wire)
    }

    // ------------------------------------------------------------------
    // Events, civic bodies, audit
    // ------------------------------------------------------------------

    pub async fn events(&self) -> Result<Vec<LedgerEvent>> {
        let raw = self.cached_query(CacheKey::Events, "list_events").await?;
        decode_list(&raw, LedgerEvent::from_wire)
    }

    pub async fn civic_bodies(&self) -> Result<Vec<CivicBody>> {
        let raw = self
            .cached_query(CacheKey::CivicBodies, "list_civic_bodies")
            .await?;
        decode_list(&raw, CivicBody::from_wire)
    }

    pub async fn recent_activity(&self) -> Result<Vec<AuditEntry>> {
        let raw = self.cached_query(CacheKey::Audit, "get_recent_activity").await?;
        decode_list(&raw, AuditEntry::from_wire)
    }

    pub async fn audit_page(&self, page: u32, limit: u32) -> Result<Page<AuditEntry>> {
        let raw = self
            .direct_query("get_audit_page", json!({"page": page, "limit": limit}))
            .await?;
        Page::from_wire(&raw, AuditEntry::from_wire)
    }

    // ------------------------------------------------------------------
    // Approval workflows
    // ------------------------------------------------------------------

    pub async fn high_value_requests(&self) -> Result<Vec<HighValueRequest>> {
        let raw = self
            .cached_query(CacheKey::HighValue, "list_high_value_requests")
            .await?;
        decode_list(&raw, HighValueRequest::from_wire)
    }

    pub async fn recovery_requests(&self) -> Result<Vec<WalletChangeRequest>> {
        let raw = self
            .cached_query(CacheKey::Recovery, "list_wallet_change_requests")
            .await?;
        decode_list(&raw, WalletChangeRequest::from_wire)
    }
}
