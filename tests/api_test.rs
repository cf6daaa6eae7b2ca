//! HTTP API Tests
//!
//! Drives the router in-process and checks status codes and bodies.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use airline_membership::api::{router, AppState, CALLER_HEADER};
use airline_membership::journal::{EventJournal, JournalSink};
use common::*;

fn app() -> Router {
    router(AppState::new(setup_network(), None))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_and_initial_state() {
    let app = app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["registered_airlines"], 1);

    let (_, body) = send(&app, "GET", "/operational", None, None).await;
    assert_eq!(body["operational"], true);

    let (_, body) = send(&app, "GET", "/airlines/count", None, None).await;
    assert_eq!(body["count"], 1);

    let (status, body) = send(&app, "GET", &format!("/airlines/{}", OWNER), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "funded");
    assert_eq!(body["funded_amount"], 10);
}

#[tokio::test]
async fn test_register_and_fund_over_http() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "candidate": "airline1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "finalized");
    assert_eq!(body["candidate"], "airline1");

    let (_, body) = send(&app, "GET", "/airlines/airline1/registered", None, None).await;
    assert_eq!(body["registered"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some("airline1"),
        Some(json!({ "candidate": "airline2" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "proposer_not_funded");

    let (status, body) = send(
        &app,
        "POST",
        "/airlines/fund",
        Some("airline1"),
        Some(json!({ "amount": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_funding");

    let (status, body) = send(
        &app,
        "POST",
        "/airlines/fund",
        Some("airline1"),
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "funded");
    assert_eq!(body["funded_amount"], 10);
}

#[tokio::test]
async fn test_pending_consensus_is_accepted_not_failed() {
    let app = app();
    for name in ["airline5", "airline6", "airline7"] {
        let (status, _) = send(
            &app,
            "POST",
            "/airlines",
            Some(OWNER),
            Some(json!({ "candidate": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "candidate": "airline8" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["outcome"], "pending_consensus");
    assert_eq!(body["votes"], 1);
    assert_eq!(body["required"], 2);

    let (status, body) = send(&app, "GET", "/proposals/airline8", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["voters"], json!([OWNER]));

    send(
        &app,
        "POST",
        "/airlines/fund",
        Some("airline6"),
        Some(json!({ "amount": 10 })),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        "/airlines",
        Some("airline6"),
        Some(json!({ "candidate": "airline8" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/airlines/count", None, None).await;
    assert_eq!(body["count"], 5);

    let (status, body) = send(&app, "GET", "/proposals/airline8", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no_pending_proposal");
}

#[tokio::test]
async fn test_operating_status_is_owner_only() {
    let app = app();

    let (status, body) = send(
        &app,
        "PUT",
        "/operational",
        None,
        Some(json!({ "operational": false })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_caller");

    let (status, body) = send(
        &app,
        "PUT",
        "/operational",
        Some("airline2"),
        Some(json!({ "operational": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = send(
        &app,
        "PUT",
        "/operational",
        Some(OWNER),
        Some(json!({ "operational": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["operational"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "candidate": "airline1" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_suspended");

    // Queries still work while suspended
    let (status, _) = send(&app, "GET", "/airlines/count", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_airline_and_bad_identifier() {
    let app = app();

    let (status, body) = send(&app, "GET", "/airlines/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_airline");

    let (_, body) = send(&app, "GET", "/airlines/nobody/registered", None, None).await;
    assert_eq!(body["registered"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/airlines/fund",
        Some("   "),
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_identifier");

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "candidate": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_identifier");

    let (_, body) = send(&app, "GET", "/airlines/count", None, None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_malformed_body_is_reported_as_json() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "airline": "airline1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");
    assert!(body["message"].as_str().unwrap().contains("candidate"));

    let (status, body) = send(
        &app,
        "POST",
        "/airlines/fund",
        Some(OWNER),
        Some(json!({ "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn test_journal_endpoint_and_file_mirror() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let app = router(AppState::new(setup_network(), Some(JournalSink::new(&path))));

    send(
        &app,
        "POST",
        "/airlines",
        Some(OWNER),
        Some(json!({ "candidate": "airline1" })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/journal", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["event"]["type"], "airline_registered");

    let mirrored = EventJournal::load(&path).unwrap();
    assert_eq!(mirrored.len(), 2);
    assert_eq!(body["head_hash"], mirrored.head_hash());
}

#[tokio::test]
async fn test_written_journal_entries_leave_memory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = JournalSink::new(&path).with_retention(1);
    let app = router(AppState::new(setup_network(), Some(sink)));

    for name in ["airline1", "airline2", "airline3"] {
        send(
            &app,
            "POST",
            "/airlines",
            Some(OWNER),
            Some(json!({ "candidate": name })),
        )
        .await;
    }

    let (_, body) = send(&app, "GET", "/journal", None, None).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(body["first_sequence"], 3);
    assert_eq!(entries[0]["event"]["airline"], "airline3");

    let (_, health) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(health["journal_entries"], 4);

    let mirrored = EventJournal::load(&path).unwrap();
    assert_eq!(mirrored.len(), 4);
    assert_eq!(body["head_hash"], mirrored.head_hash());
}
