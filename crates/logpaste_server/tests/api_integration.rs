//! Integration tests for the LogPaste HTTP API.

mod support;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};
use support::{setup_test_app, setup_test_app_with_limits, test_app_for_config, test_config};

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

/// Path and query of an absolute URL returned by the API.
fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    after_scheme
        .find('/')
        .map_or("/", |start| &after_scheme[start..])
}

#[tokio::test]
async fn test_paste_lifecycle() {
    let app = setup_test_app();

    let create_response = app
        .server
        .post("/api/pastes")
        .json(&json!({
            "content": "2024-01-01T00:00:00Z ERROR worker crashed",
            "title": "  Worker crash  ",
            "source": "billing-worker",
            "expiresInMinutes": 60
        }))
        .await;
    assert_eq!(create_response.status_code(), StatusCode::CREATED);
    let created: Value = create_response.json();
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(id.len(), 8);
    let url = created["url"].as_str().expect("url");
    let raw_url = created["rawUrl"].as_str().expect("rawUrl");
    assert_eq!(path_of(url), format!("/api/pastes/{}", id));
    assert_eq!(path_of(raw_url), format!("/api/pastes/{}/raw", id));

    let followed = app.server.get(path_of(url)).await;
    assert_eq!(followed.status_code(), StatusCode::OK);
    let followed_raw = app.server.get(path_of(raw_url)).await;
    assert_eq!(followed_raw.status_code(), StatusCode::OK);
    assert_eq!(followed_raw.text(), "2024-01-01T00:00:00Z ERROR worker crashed");
    let created_at = created["createdAt"].as_i64().expect("createdAt");
    assert_eq!(created["expiresAt"].as_i64(), Some(created_at + 60 * 60_000));

    let get_response = app.server.get(&format!("/api/pastes/{}", id)).await;
    assert_eq!(get_response.status_code(), StatusCode::OK);
    let paste: Value = get_response.json();
    assert_eq!(paste["content"], "2024-01-01T00:00:00Z ERROR worker crashed");
    assert_eq!(paste["title"], "Worker crash");
    assert_eq!(paste["source"], "billing-worker");

    let list_response = app.server.get("/api/pastes").await;
    assert_eq!(list_response.status_code(), StatusCode::OK);
    let listed: Vec<Value> = list_response.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(
        listed[0]["contentPreview"],
        "2024-01-01T00:00:00Z ERROR worker crashed"
    );
    assert!(listed[0].get("content").is_none());
}

#[tokio::test]
async fn test_defaults_for_minimal_payload() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "just a line" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    assert!(created["expiresAt"].is_null());

    let paste: Value = app
        .server
        .get(&format!("/api/pastes/{}", created["id"].as_str().expect("id")))
        .await
        .json();
    assert_eq!(paste["title"], "Untitled Paste");
    assert!(paste.get("source").is_none());
}

#[tokio::test]
async fn test_raw_download_headers() {
    let app = setup_test_app();
    let created: Value = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "line one\nline two\n" }))
        .await
        .json();
    let id = created["id"].as_str().expect("id");

    let response = app.server.get(&format!("/api/pastes/{}/raw", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.assert_header("content-type", "text/plain; charset=utf-8");
    response.assert_header(
        "content-disposition",
        format!("inline; filename=\"logpaste-{}.log\"", id),
    );
    assert_eq!(response.text(), "line one\nline two\n");
}

#[tokio::test]
async fn test_padded_id_is_not_trimmed() {
    let app = setup_test_app();
    let created: Value = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "exact match only" }))
        .await
        .json();
    let id = created["id"].as_str().expect("id");

    let padded = app.server.get(&format!("/api/pastes/%20{}", id)).await;
    assert_eq!(padded.status_code(), StatusCode::NOT_FOUND);
    let exact = app.server.get(&format!("/api/pastes/{}", id)).await;
    assert_eq!(exact.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_paste_returns_not_found() {
    let app = setup_test_app();

    for path in ["/api/pastes/doesnotx", "/api/pastes/doesnotx/raw"] {
        let response = app.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "Paste not found");
    }
}

#[tokio::test]
async fn test_expired_paste_disappears() {
    let app = setup_test_app();
    let created: Value = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "temporary", "expiresInMinutes": "10" }))
        .await
        .json();
    let id = created["id"].as_str().expect("id");

    app.clock.advance(Duration::minutes(10) - Duration::milliseconds(1));
    let still_there = app.server.get(&format!("/api/pastes/{}", id)).await;
    assert_eq!(still_there.status_code(), StatusCode::OK);

    app.clock.advance(Duration::milliseconds(2));
    let gone = app.server.get(&format!("/api/pastes/{}", id)).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);

    let listed: Vec<Value> = app.server.get("/api/pastes").await.json();
    assert!(listed.is_empty(), "lazy eviction also drops the index entry");
}

#[tokio::test]
async fn test_expiration_forms() {
    let app = setup_test_app();

    let float_minutes = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "x", "expiresInMinutes": 60.0 }))
        .await;
    assert_eq!(float_minutes.status_code(), StatusCode::CREATED);
    let created: Value = float_minutes.json();
    let created_at = created["createdAt"].as_i64().expect("createdAt");
    assert_eq!(created["expiresAt"].as_i64(), Some(created_at + 60 * 60_000));

    let never = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "x", "expiresInMinutes": "never" }))
        .await;
    assert_eq!(never.status_code(), StatusCode::CREATED);
    assert!(never.json::<Value>()["expiresAt"].is_null());

    for raw in [json!(" NEVER "), json!("Never"), json!(60.5)] {
        let response = app
            .server
            .post("/api/pastes")
            .json(&json!({ "content": "x", "expiresInMinutes": raw.clone() }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "raw: {}", raw);
        let body: Value = response.json();
        assert_eq!(body["error"], "Unsupported expiration option", "raw: {}", raw);
    }
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let app = setup_test_app();
    let cases = [
        (json!({ "content": "" }), "Log content is required"),
        (json!({ "title": "no content" }), "Invalid payload"),
        (json!({ "content": "x", "unexpected": true }), "Invalid payload"),
        (json!({ "content": 42 }), "Invalid payload"),
        (
            json!({ "content": "x", "expiresInMinutes": 15 }),
            "Unsupported expiration option",
        ),
        (
            json!({ "content": "x", "title": "t".repeat(121) }),
            "Title must be <= 120 characters",
        ),
    ];

    for (payload, expected) in cases {
        let response = app.server.post("/api/pastes").json(&payload).await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "payload: {}",
            payload
        );
        let body: Value = response.json();
        assert_eq!(body["error"], expected, "payload: {}", payload);
    }

    let malformed = app
        .server
        .post("/api/pastes")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

    assert!(app.db.pastes.list_recent(25).expect("list").is_empty());
}

#[tokio::test]
async fn test_oversized_paste_is_rejected() {
    let app = test_app_for_config(logpaste_server::Config {
        max_content_bytes: 1024,
        ..test_config()
    });

    let response = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "a".repeat(1025) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["error"], "Paste too large. Limit 1KB.");

    // Far past the request body ceiling as well.
    let huge = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "a".repeat(200 * 1024) }))
        .await;
    assert_eq!(huge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = huge.json();
    assert_eq!(body["error"], "Paste too large. Limit 1KB.");

    let exact = app
        .server
        .post("/api/pastes")
        .json(&json!({ "content": "a".repeat(1024) }))
        .await;
    assert_eq!(exact.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_escaped_control_characters_within_limit_are_accepted() {
    let app = setup_test_app();
    let content = "\u{1b}".repeat(100_000);
    let body = json!({ "content": content.clone() });
    assert!(
        serde_json::to_vec(&body).expect("serialize").len() > 2 * 256 * 1024,
        "escaped body should be far larger than the decoded content"
    );

    let response = app.server.post("/api/pastes").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    let raw = app
        .server
        .get(&format!("/api/pastes/{}/raw", created["id"].as_str().expect("id")))
        .await;
    assert_eq!(raw.text(), content);
}

#[tokio::test]
async fn test_rate_limit_per_client_window() {
    let app = setup_test_app_with_limits(60_000, 2);
    let (name, alice) = forwarded_for("198.51.100.1");

    for _ in 0..2 {
        let response = app
            .server
            .post("/api/pastes")
            .add_header(name.clone(), alice.clone())
            .json(&json!({ "content": "ok" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let limited = app
        .server
        .post("/api/pastes")
        .add_header(name.clone(), alice.clone())
        .json(&json!({ "content": "too many" }))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    limited.assert_header("retry-after", "60");
    let body: Value = limited.json();
    assert_eq!(body["error"], "Rate limit exceeded. Try again in 60s.");

    // Reads are never counted.
    let listed = app.server.get("/api/pastes").await;
    assert_eq!(listed.status_code(), StatusCode::OK);

    let (_, bob) = forwarded_for("198.51.100.2");
    let other_client = app
        .server
        .post("/api/pastes")
        .add_header(name.clone(), bob)
        .json(&json!({ "content": "separate window" }))
        .await;
    assert_eq!(other_client.status_code(), StatusCode::CREATED);

    app.clock.advance(Duration::milliseconds(60_000));
    let after_reset = app
        .server
        .post("/api/pastes")
        .add_header(name, alice)
        .json(&json!({ "content": "fresh window" }))
        .await;
    assert_eq!(after_reset.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_rate_limit_runs_before_validation() {
    let app = setup_test_app_with_limits(60_000, 1);
    let (name, ip) = forwarded_for("203.0.113.77");

    let invalid = app
        .server
        .post("/api/pastes")
        .add_header(name.clone(), ip.clone())
        .json(&json!({ "content": "" }))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

    let limited = app
        .server
        .post("/api/pastes")
        .add_header(name, ip)
        .json(&json!({ "content": "valid but late" }))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_recent_listing_limit() {
    let app = setup_test_app();
    let mut ids = Vec::new();
    for n in 0..4 {
        let created: Value = app
            .server
            .post("/api/pastes")
            .json(&json!({ "content": format!("paste {}", n) }))
            .await
            .json();
        ids.push(created["id"].as_str().expect("id").to_string());
        app.clock.advance(Duration::seconds(1));
    }

    let listed: Vec<Value> = app
        .server
        .get("/api/pastes")
        .add_query_param("limit", 2)
        .await
        .json();
    let listed_ids: Vec<&str> = listed
        .iter()
        .map(|item| item["id"].as_str().expect("id"))
        .collect();
    assert_eq!(listed_ids, vec![ids[3].as_str(), ids[2].as_str()]);

    let invalid = app
        .server
        .get("/api/pastes")
        .add_query_param("limit", "lots")
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app();
    let response = app.server.get("/api/pastes").await;
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("x-frame-options", "DENY");
    response.assert_contains_header("content-security-policy");
}
