//! End-to-end workflow tests against a scripted ledger service
//!
//! Drives the full client stack (session, cache, gateway, catalogue) over an
//! in-process transport:
//! - expired-allocation rollover and the post-mutation listing refresh
//! - the multi-signature high-value approval flow
//! - the client-side wallet-change cooldown guard
//! - pagination with remote-authoritative has_more
//! - rejection leaving cached aggregates untouched

use async_trait::async_trait;
use bantay_client::{
    allocation_actions, high_value_actions, ActorId, AllocationAction, AllocationStatus,
    ApprovalAction, BantayClient, CacheKey, CallKind, CivicBody, ClientError, HighValueStatus,
    MutationFailure, NetworkTarget, RemoteHandle, Result, SessionState, Tokens, Transport,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

// =============================================================================
// Scripted service
// =============================================================================

/// In-process stand-in for the remote service. Scripted responses are popped
/// per method in request order; the session warm-up calls have defaults.
struct FakeLedger {
    actor: &'static str,
    responses: Mutex<HashMap<&'static str, VecDeque<Value>>>,
    log: Mutex<Vec<String>>,
}

impl FakeLedger {
    fn new(actor: &'static str) -> Arc<Self> {
        Arc::new(Self {
            actor,
            responses: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        })
    }

    fn script(&self, method: &'static str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(response);
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeLedger {
    async fn dispatch(&self, _kind: CallKind, method: &str, _args: Value) -> Result<Value> {
        self.log.lock().unwrap().push(method.to_string());
        if let Some(queue) = self.responses.lock().unwrap().get_mut(method) {
            if let Some(v) = queue.pop_front() {
                return Ok(v);
            }
        }
        match method {
            "liveness" => Ok(json!(true)),
            "whoami" => Ok(json!(self.actor)),
            "get_system_metrics" => Ok(json!({
                "total_allocated": "900000000000",
                "total_spent": "120000000000",
                "transaction_count": 45,
                "wallet_count": 12,
                "civic_body_count": 8,
            })),
            other => Err(ClientError::Transport(format!("unscripted method {other}"))),
        }
    }
}

async fn connected_client(ledger: Arc<FakeLedger>) -> BantayClient {
    let handle = Arc::new(RemoteHandle::from_parts(ledger, false));
    let client = BantayClient::from_parts(
        NetworkTarget::Main {
            base_url: "https://ledger.test".into(),
        },
        handle.clone(),
    );
    let state = client.session().attach(handle).await;
    assert!(matches!(state, SessionState::Connected { .. }), "{state:?}");
    client
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap()
}

fn nanos(t: DateTime<Utc>) -> i64 {
    t.timestamp_nanos_opt().unwrap()
}

fn allocation_wire(id: &str, status: &str, allocated: u64, spent: u64) -> Value {
    json!({
        "id": id,
        "category": "Roads",
        "civic_body": ["body-7"],
        "period": "Q1",
        "allocated": allocated.to_string(),
        "spent": spent,
        "fiscal_year": 2026,
        "description": [],
        "status": {status: null},
        "created_by": "treasurer",
        "created_at": nanos(t0()),
        "updated_at": nanos(t0()),
    })
}

fn high_value_wire(status: &str, approvals: &[&str]) -> Value {
    json!({
        "id": "hv-1",
        "allocation_id": "alloc-1",
        "requested_by": "treasurer",
        "amount": "5000000000",
        "from_address": "wallet-src",
        "to_address": "wallet-dst",
        "reason": "contractor payout",
        "status": {status: null},
        "approvals": approvals,
        "required_approvals": 2,
        "created_at": nanos(t0()),
        "resolved_at": [],
        "rejected_by": [],
        "rejection_reason": [],
    })
}

fn transaction_wire(id: &str) -> Value {
    json!({
        "id": id,
        "from_address": "wallet-src",
        "to_address": "wallet-dst",
        "amount": "250000000",
        "status": {"Confirmed": null},
        "memo": [],
        "created_at": nanos(t0()),
    })
}

// =============================================================================
// Allocation rollover
// =============================================================================

#[tokio::test]
async fn expired_allocation_rolls_over_and_listing_refreshes() {
    let ledger = FakeLedger::new("treasurer");
    ledger.script(
        "list_allocations",
        json!([allocation_wire("alloc-1", "Expired", 1_000_000, 400_000)]),
    );
    let client = connected_client(ledger.clone()).await;

    let listing = client.allocations().await.unwrap();
    assert_eq!(listing.len(), 1);
    let expired = &listing[0];
    assert_eq!(expired.status, AllocationStatus::Expired);

    // The unspent remainder drives the offered rollover.
    let actions = allocation_actions(expired);
    assert!(actions.contains(&AllocationAction::Rollover {
        remaining: Tokens(600_000)
    }));

    ledger.script(
        "rollover_allocation",
        json!({"ok": allocation_wire("alloc-2", "Draft", 600_000, 0)}),
    );
    let draft = client
        .rollover_allocation("alloc-1", 2027, "Q1")
        .await
        .unwrap();
    assert_eq!(draft.status, AllocationStatus::Draft);
    assert_eq!(draft.allocated, Tokens(600_000));

    // The next listing read reaches the service again and sees both rows.
    ledger.script(
        "list_allocations",
        json!([
            allocation_wire("alloc-1", "Expired", 1_000_000, 400_000),
            allocation_wire("alloc-2", "Draft", 600_000, 0),
        ]),
    );
    let listing = client.allocations().await.unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[1].id, "alloc-2");
}

// =============================================================================
// High-value approval
// =============================================================================

#[tokio::test]
async fn second_signature_completes_high_value_approval() {
    let ledger = FakeLedger::new("principal-b");
    ledger.script(
        "list_high_value_requests",
        json!([high_value_wire("PendingApproval", &["principal-a"])]),
    );
    let client = connected_client(ledger.clone()).await;

    let pending = client.high_value_requests().await.unwrap();
    let request = &pending[0];
    assert_eq!(request.status, HighValueStatus::PendingApproval);

    // principal-b has not signed yet, so approval is on offer.
    let actions = high_value_actions(request, &ActorId("principal-b".into()));
    assert!(actions.contains(&ApprovalAction::Approve));
    // An existing approver gets no second signature.
    let actions = high_value_actions(request, &ActorId("principal-a".into()));
    assert!(!actions.contains(&ApprovalAction::Approve));

    ledger.script(
        "approve_high_value",
        json!({"ok": high_value_wire("Approved", &["principal-a", "principal-b"])}),
    );
    let approved = client.approve_high_value("hv-1").await.unwrap();
    assert_eq!(approved.status, HighValueStatus::Approved);
    assert_eq!(approved.approvals.len(), 2);

    ledger.script(
        "list_high_value_requests",
        json!([high_value_wire("Approved", &["principal-a", "principal-b"])]),
    );
    let refreshed = client.high_value_requests().await.unwrap();
    assert_eq!(
        refreshed[0].approvals,
        vec![
            ActorId("principal-a".into()),
            ActorId("principal-b".into())
        ]
    );
}

// =============================================================================
// Wallet-change cooldown
// =============================================================================

fn body_with_last_change(last_change: Option<DateTime<Utc>>) -> CivicBody {
    CivicBody {
        id: "body-7".into(),
        name: "San Isidro".into(),
        region: "Region IV-A".into(),
        wallet_address: Some("wallet-old".into()),
        last_wallet_change: last_change,
        registered_at: t0(),
        updated_at: t0(),
    }
}

#[tokio::test]
async fn cooldown_blocks_wallet_change_without_a_remote_call() {
    let ledger = FakeLedger::new("captain");
    let client = connected_client(ledger.clone()).await;
    let calls_before = ledger.calls();

    // Three days into the seven-day window.
    let body = body_with_last_change(Some(t0()));
    let now = t0() + Duration::days(3);

    let err = client
        .request_wallet_change_at(&body, "wallet-new", "hardware wallet lost", now)
        .await
        .unwrap_err();

    match err {
        MutationFailure::Rejected(message) => {
            assert!(message.contains("cooldown"), "{message}");
            assert!(message.contains("4 days"), "{message}");
            assert!(message.contains("San Isidro"), "{message}");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    // The guard fired locally; the service never saw the request.
    assert_eq!(ledger.calls(), calls_before);
}

#[tokio::test]
async fn wallet_change_goes_through_once_the_window_has_passed() {
    let ledger = FakeLedger::new("captain");
    ledger.script(
        "request_wallet_change",
        json!({"ok": {
            "id": "wc-1",
            "civic_body": "body-7",
            "previous_address": ["wallet-old"],
            "new_address": "wallet-new",
            "requested_by": "captain",
            "reason": "hardware wallet lost",
            "status": {"PendingApproval": null},
            "approved_by": [],
            "created_at": nanos(t0()),
            "resolved_at": [],
        }}),
    );
    let client = connected_client(ledger.clone()).await;

    let body = body_with_last_change(Some(t0()));
    let now = t0() + Duration::days(8);

    let request = client
        .request_wallet_change_at(&body, "wallet-new", "hardware wallet lost", now)
        .await
        .unwrap();
    assert_eq!(request.new_address, "wallet-new");
    assert!(ledger
        .calls()
        .iter()
        .any(|m| m == "request_wallet_change"));
}

#[tokio::test]
async fn first_ever_wallet_change_has_no_cooldown() {
    let ledger = FakeLedger::new("captain");
    ledger.script(
        "request_wallet_change",
        json!({"ok": {
            "id": "wc-1",
            "civic_body": "body-7",
            "previous_address": [],
            "new_address": "wallet-new",
            "requested_by": "captain",
            "reason": "initial wallet",
            "status": {"PendingApproval": null},
            "approved_by": [],
            "created_at": nanos(t0()),
            "resolved_at": [],
        }}),
    );
    let client = connected_client(ledger.clone()).await;

    let body = body_with_last_change(None);
    let request = client
        .request_wallet_change_at(&body, "wallet-new", "initial wallet", t0())
        .await
        .unwrap();
    assert_eq!(request.previous_address, None);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn paging_honors_remote_has_more() {
    let ledger = FakeLedger::new("auditor");
    // 45-row collection, limit 20: page 2 is full with more behind it.
    ledger.script(
        "list_transactions_page",
        json!({
            "items": (21..=40).map(|i| transaction_wire(&format!("tx-{i}"))).collect::<Vec<_>>(),
            "total": 45,
            "page": 2,
            "limit": 20,
            "has_more": true,
        }),
    );
    let client = connected_client(ledger.clone()).await;

    let page = client.transactions_page(2, 20).await.unwrap();
    assert_eq!(page.items.len(), 20);
    assert!(page.has_more);

    // The last, short page reports no more rows.
    ledger.script(
        "list_transactions_page",
        json!({
            "items": (41..=45).map(|i| transaction_wire(&format!("tx-{i}"))).collect::<Vec<_>>(),
            "total": 45,
            "page": 3,
            "limit": 20,
            "has_more": false,
        }),
    );
    let page = client.transactions_page(3, 20).await.unwrap();
    assert_eq!(page.items.len(), 5);
    assert!(!page.has_more);
}

// =============================================================================
// Rejection and the cache
// =============================================================================

#[tokio::test]
async fn rejected_mutation_leaves_cached_aggregates_in_place() {
    let ledger = FakeLedger::new("clerk");
    let client = connected_client(ledger.clone()).await;

    // The session warm-up populated the system aggregate.
    let warmed = client.cache().peek(CacheKey::SystemMetrics).await;
    assert!(warmed.is_some());

    ledger.script("approve_allocation", json!({"err": "not authorized"}));
    let err = client.approve_allocation("alloc-1").await.unwrap_err();
    assert_eq!(err, MutationFailure::Rejected("not authorized".into()));

    // No invalidation on rejection: the aggregate serves from cache, with no
    // second metrics call reaching the service.
    let fetches_before = ledger
        .calls()
        .iter()
        .filter(|m| *m == "get_system_metrics")
        .count();
    assert_eq!(client.cache().peek(CacheKey::SystemMetrics).await, warmed);
    let metrics = client.system_metrics().await.unwrap();
    assert_eq!(metrics.transaction_count, 45);
    let fetches_after = ledger
        .calls()
        .iter()
        .filter(|m| *m == "get_system_metrics")
        .count();
    assert_eq!(fetches_before, fetches_after);
}
