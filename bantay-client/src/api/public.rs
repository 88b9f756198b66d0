//! Credential-free public surface.
//!
//! These operations dispatch on the anonymous handle and never touch the
//! session cache: the public pages render fresh figures on every load.

use crate::api::BantayClient;
use crate::error::Result;
use crate::wire::codec::decode_list;
use crate::wire::records::{BodyRollup, PublicBudgetSummary, PublicEvent, PublicTransaction};
use serde_json::{json, Value};

impl BantayClient {
    /// Aggregate budget figures for one fiscal year.
    pub async fn public_budget_summary(&self, fiscal_year: u32) -> Result<PublicBudgetSummary> {
        let raw = self
            .public
            .query("get_public_budget_summary", json!({"fiscal_year": fiscal_year}))
            .await?;
        PublicBudgetSummary::from_wire(&raw)
    }

    pub async fn public_events(&self) -> Result<Vec<PublicEvent>> {
        let raw = self.public.query("list_public_events", Value::Null).await?;
        decode_list(&raw, PublicEvent::from_wire)
    }

    pub async fn public_transactions(&self) -> Result<Vec<PublicTransaction>> {
        let raw = self
            .public
            .query("list_public_transactions", Value::Null)
            .await?;
        decode_list(&raw, PublicTransaction::from_wire)
    }

    /// Per-civic-body totals of received and spent funds.
    pub async fn public_body_rollups(&self) -> Result<Vec<BodyRollup>> {
        let raw = self
            .public
            .query("get_public_body_rollups", Value::Null)
            .await?;
        decode_list(&raw, BodyRollup::from_wire)
    }

    pub async fn public_wallet_transactions(&self, address: &str) -> Result<Vec<PublicTransaction>> {
        let raw = self
            .public
            .query("list_public_wallet_transactions", json!({"address": address}))
            .await?;
        decode_list(&raw, PublicTransaction::from_wire)
    }
}
