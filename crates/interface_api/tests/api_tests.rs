//! End-to-end API tests over the in-memory store
//!
//! Exercises the full router without a database; the PostgreSQL adapter
//! is covered by its own crate's tests.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use domain_ledger::MemoryEntryStore;
use interface_api::{config::ApiConfig, create_router, AppState};

fn server_with(config: ApiConfig) -> TestServer {
    let store = Arc::new(MemoryEntryStore::new());
    let state = AppState::new(store, config);
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(ApiConfig::default())
}

async fn append(server: &TestServer, owner_id: &str, amount: &str) -> Value {
    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": owner_id,
            "amount": amount,
            "scale": 2,
            "entry_type": "charge",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");

    // No pool attached: readiness reports ready without a database ping.
    let response = server.get("/health/ready").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_append_returns_created_entry() {
    let server = server();

    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": "biz-1",
            "amount": "100.00",
            "scale": 2,
            "entry_type": "charge",
            "description": "checkout",
            "metadata": {"order_id": "ord-1"},
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert!(body["id"].as_str().unwrap().starts_with("ENT-"));
    assert_eq!(body["owner_kind"], "business");
    assert_eq!(body["amount"], "100.00");
    assert_eq!(body["running_balance"], "100.00");
    assert_eq!(body["entry_type"], "charge");
    assert_eq!(body["metadata"]["order_id"], "ord-1");
    assert!(body["reversed_at"].is_null());
}

#[tokio::test]
async fn test_running_balance_accumulates() {
    let server = server();

    append(&server, "biz-2", "100.00").await;
    let second = append(&server, "biz-2", "-30.00").await;
    assert_eq!(second["running_balance"], "70.00");

    let response = server
        .get("/api/v1/ledger/owners/business/biz-2/balance")
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["balance"], "70.00");
    assert_eq!(body["scale"], 2);
}

#[tokio::test]
async fn test_zero_amount_rejected() {
    let server = server();

    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": "biz-3",
            "amount": "0.00",
            "scale": 2,
            "entry_type": "charge",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"], "validation_error");
}

#[tokio::test]
async fn test_reversal_type_not_directly_postable() {
    let server = server();

    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": "biz-4",
            "amount": "10.00",
            "scale": 2,
            "entry_type": "reversal",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_scale_mismatch_rejected() {
    let server = server();

    append(&server, "biz-5", "100.00").await;

    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": "biz-5",
            "amount": "1.5",
            "scale": 1,
            "entry_type": "charge",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_no_overdraft_policy() {
    let server = server_with(ApiConfig {
        allow_negative_balance: false,
        ..ApiConfig::default()
    });

    append(&server, "biz-6", "50.00").await;

    let response = server
        .post("/api/v1/ledger/entries")
        .json(&json!({
            "owner_kind": "business",
            "owner_id": "biz-6",
            "amount": "-80.00",
            "scale": 2,
            "entry_type": "charge",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Insufficient balance"));
}

#[tokio::test]
async fn test_get_entry() {
    let server = server();

    let created = append(&server, "biz-7", "42.00").await;
    let id = created["id"].as_str().unwrap();

    let response = server.get(&format!("/api/v1/ledger/entries/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["id"], *id);

    let response = server.get("/api/v1/ledger/entries/not-an-id").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let missing = format!("ENT-{}", uuid::Uuid::now_v7());
    let response = server.get(&format!("/api/v1/ledger/entries/{missing}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reverse_is_idempotent() {
    let server = server();

    let created = append(&server, "biz-8", "100.00").await;
    let id = created["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/ledger/entries/{id}/reverse"))
        .json(&json!({"reason": "customer dispute"}))
        .await;
    response.assert_status_ok();
    let first = response.json::<Value>();
    assert_eq!(first["already_reversed"], false);
    assert_eq!(first["entry"]["amount"], "-100.00");
    assert_eq!(first["entry"]["entry_type"], "reversal");
    assert_eq!(first["entry"]["reversal_of"], *id);

    // Second request reports the existing compensation.
    let response = server
        .post(&format!("/api/v1/ledger/entries/{id}/reverse"))
        .json(&json!({"reason": "retry"}))
        .await;
    response.assert_status_ok();
    let second = response.json::<Value>();
    assert_eq!(second["already_reversed"], true);
    assert_eq!(second["entry"]["id"], first["entry"]["id"]);

    // The original now carries the reversed flag.
    let response = server.get(&format!("/api/v1/ledger/entries/{id}")).await;
    assert!(!response.json::<Value>()["reversed_at"].is_null());
}

#[tokio::test]
async fn test_chained_reversal_conflicts_by_default() {
    let server = server();

    let created = append(&server, "biz-9", "100.00").await;
    let id = created["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/ledger/entries/{id}/reverse"))
        .json(&json!({"reason": "dispute"}))
        .await;
    let compensation_id = response.json::<Value>()["entry"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post(&format!("/api/v1/ledger/entries/{compensation_id}/reverse"))
        .json(&json!({"reason": "re-reverse"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // A settled outcome, not a transient race: the client must not retry.
    let body = response.json::<Value>();
    assert_eq!(body["retryable"], json!(false));
}

#[tokio::test]
async fn test_balance_as_of() {
    let server = server();

    append(&server, "biz-10", "100.00").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let midpoint = chrono::Utc::now();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    append(&server, "biz-10", "-25.50").await;

    let response = server
        .get("/api/v1/ledger/owners/business/biz-10/balance")
        .add_query_param("as_of", midpoint.to_rfc3339())
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["balance"], "100.00");

    let response = server
        .get("/api/v1/ledger/owners/business/biz-10/balance")
        .await;
    assert_eq!(response.json::<Value>()["balance"], "74.50");
}

#[tokio::test]
async fn test_unknown_owner_has_zero_balance() {
    let server = server();

    let response = server
        .get("/api/v1/ledger/owners/business/never-seen/balance")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["balance"], "0");
}

#[tokio::test]
async fn test_history_pagination() {
    let server = server();

    for i in 1..=5 {
        append(&server, "biz-11", &format!("{i}.00")).await;
    }

    let response = server
        .get("/api/v1/ledger/owners/business/biz-11/history")
        .add_query_param("limit", "2")
        .await;
    response.assert_status_ok();
    let first = response.json::<Value>();
    assert_eq!(first["entries"].as_array().unwrap().len(), 2);
    let token = first["next_token"].as_str().unwrap().to_string();

    let response = server
        .get("/api/v1/ledger/owners/business/biz-11/history")
        .add_query_param("limit", "2")
        .add_query_param("token", &token)
        .await;
    let second = response.json::<Value>();
    assert_eq!(second["entries"].as_array().unwrap().len(), 2);
    assert_ne!(
        first["entries"][0]["id"].as_str(),
        second["entries"][0]["id"].as_str()
    );

    let response = server
        .get("/api/v1/ledger/owners/business/biz-11/history")
        .add_query_param("limit", "2")
        .add_query_param("token", second["next_token"].as_str().unwrap())
        .await;
    let third = response.json::<Value>();
    assert_eq!(third["entries"].as_array().unwrap().len(), 1);
    assert!(third["next_token"].is_null());
}

#[tokio::test]
async fn test_malformed_page_token() {
    let server = server();

    let response = server
        .get("/api/v1/ledger/owners/business/biz-12/history")
        .add_query_param("token", "garbage")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_export_flags_voided_entries() {
    let server = server();

    let first = append(&server, "biz-13", "100.00").await;
    append(&server, "biz-13", "20.00").await;
    let id = first["id"].as_str().unwrap();

    server
        .post(&format!("/api/v1/ledger/entries/{id}/reverse"))
        .json(&json!({"reason": "dispute"}))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/v1/ledger/owners/business/biz-13/audit")
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["voided"], true);
    assert_eq!(records[1]["voided"], false);
    assert_eq!(records[2]["voided"], false);
    assert_eq!(records[2]["entry_type"], "reversal");
}
