mod common;

use serde_json::{Value, json};

#[tokio::test]
async fn test_shorten_generated_code() {
    let (server, _store) = common::create_test_server();

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com/some/long/path" }))
        .await;

    assert_eq!(response.status_code(), 201);

    let json = response.json::<Value>();
    let code = json["short_code"].as_str().unwrap();

    assert_eq!(code.len(), 7);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(json["short_url"], format!("https://sho.rt/{}", code));
    assert_eq!(json["original_url"], "https://example.com/some/long/path");
    assert!(json["created_at"].is_string());
    assert!(json["expires_at"].is_string());
}

#[tokio::test]
async fn test_shorten_custom_code() {
    let (server, _store) = common::create_test_server();

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com", "custom_code": "my-Link_1" }))
        .await;

    assert_eq!(response.status_code(), 201);

    let json = response.json::<Value>();
    assert_eq!(json["short_code"], "my-Link_1");
    assert_eq!(json["short_url"], "https://sho.rt/my-Link_1");
}

#[tokio::test]
async fn test_shorten_custom_code_is_idempotent_for_same_url() {
    let (server, _store) = common::create_test_server();
    let body = json!({ "url": "https://example.com", "custom_code": "again" });

    let first = server.post("/api/v1/shorten").json(&body).await;
    let second = server.post("/api/v1/shorten").json(&body).await;

    assert_eq!(first.status_code(), 201);
    assert_eq!(second.status_code(), 201);
    assert_eq!(
        first.json::<Value>()["created_at"],
        second.json::<Value>()["created_at"]
    );
}

#[tokio::test]
async fn test_shorten_custom_code_conflict() {
    let (server, _store) = common::create_test_server();

    server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com/a", "custom_code": "taken" }))
        .await;

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com/b", "custom_code": "taken" }))
        .await;

    assert_eq!(response.status_code(), 409);

    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "code_already_exists");
}

#[tokio::test]
async fn test_shorten_custom_code_over_expired_record() {
    let (server, store) = common::create_test_server();
    common::insert_expired_record(&store, "reused", "https://old.example").await;

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://new.example", "custom_code": "reused" }))
        .await;

    assert_eq!(response.status_code(), 201);

    let stats = server.get("/api/v1/stats/reused").await;
    let json = stats.json::<Value>();
    assert_eq!(json["original_url"], "https://new.example");
    assert_eq!(json["clicks"], 0);
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let (server, _store) = common::create_test_server();

    for url in ["not-a-url", "javascript:alert(1)", "ftp://example.com/file", ""] {
        let response = server
            .post("/api/v1/shorten")
            .json(&json!({ "url": url }))
            .await;

        assert_eq!(response.status_code(), 400, "{}", url);
        assert_eq!(response.json::<Value>()["error"]["code"], "invalid_url");
    }
}

#[tokio::test]
async fn test_shorten_rejects_control_characters() {
    let (server, store) = common::create_test_server();

    for url in [
        "https://example.com/a\nb",
        "https://example.com/a\r\nSet-Cookie: x=1",
        "https://exa\tmple.com/",
    ] {
        let response = server
            .post("/api/v1/shorten")
            .json(&json!({ "url": url }))
            .await;

        assert_eq!(response.status_code(), 400, "{:?}", url);
        assert_eq!(response.json::<Value>()["error"]["code"], "invalid_url");
    }

    // Only the rate-limit window was written.
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_shorten_url_too_long() {
    let (server, _store) = common::create_test_server();
    let url = format!("https://example.com/{}", "a".repeat(2048));

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": url }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_shorten_invalid_custom_code() {
    let (server, _store) = common::create_test_server();

    for code in ["abc", "has space", "slash/es", "health", &"x".repeat(21)] {
        let response = server
            .post("/api/v1/shorten")
            .json(&json!({ "url": "https://example.com", "custom_code": code }))
            .await;

        assert_eq!(response.status_code(), 400, "{}", code);
        assert_eq!(response.json::<Value>()["error"]["code"], "invalid_code");
    }
}

#[tokio::test]
async fn test_shorten_ttl_bounds() {
    let (server, _store) = common::create_test_server();

    let too_small = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com", "ttl": 0 }))
        .await;
    assert_eq!(too_small.status_code(), 400);

    let too_large = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com", "ttl": 31_536_001u64 }))
        .await;
    assert_eq!(too_large.status_code(), 400);

    let ok = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com", "ttl": 60 }))
        .await;
    assert_eq!(ok.status_code(), 201);
}

#[tokio::test]
async fn test_shorten_malformed_body() {
    let (server, _store) = common::create_test_server();

    let response = server
        .post("/api/v1/shorten")
        .text("{ not json")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_without_expiry() {
    let mut config = common::test_config();
    config.url_ttl_seconds = 0;
    let (server, _store) = common::create_test_server_from(&config, "127.0.0.1:12345");

    let response = server
        .post("/api/v1/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), 201);
    assert!(response.json::<Value>()["expires_at"].is_null());
}
