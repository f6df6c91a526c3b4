mod common;

use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use jsondb_cloud::{
    ApiErrorKind, BulkOperation, ClientOptions, Filter, FilterOp, ImportOptions, JsonDb,
    JsonDbError, ListOptions, PatchOperation, Request, WebhookConfig, WebhookUpdate,
};
use serde_json::json;

use common::{doc, spawn_server, MockResponse, API_KEY};

#[tokio::test]
async fn create_sends_bearer_token_and_json_body() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::CREATED,
        doc("abc123", json!({"name": "Alice"})),
    )])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");

    let created = db
        .collection("users")
        .create(&json!({"name": "Alice", "email": "alice@example.com"}))
        .await
        .expect("create must succeed");

    assert_eq!(created["_id"], "abc123");
    let request = server.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.uri, "/v1/users");
    assert_eq!(
        request.header("authorization"),
        Some(format!("Bearer {API_KEY}").as_str())
    );
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("accept"), Some("application/json"));
    assert_eq!(
        request.json(),
        json!({"name": "Alice", "email": "alice@example.com"})
    );
}

#[tokio::test]
async fn create_with_explicit_id_and_custom_project() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::CREATED,
        doc("alice", json!({})),
    )])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0).project("myns"))
        .expect("client must build");

    db.collection("users")
        .create_with_id("alice", &json!({"name": "Alice"}))
        .await
        .expect("create must succeed");

    assert_eq!(server.last_request().uri, "/myns/users/alice");
}

#[tokio::test]
async fn list_sends_filters_and_decodes_meta() {
    let server = spawn_server(vec![MockResponse::ok(json!({
        "data": [doc("a", json!({"role": "admin"}))],
        "meta": {"total": 30, "limit": 10, "offset": 0, "hasMore": true}
    }))])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");

    let options = ListOptions::new()
        .filter(
            Filter::new()
                .eq("role", "admin")
                .op("age", FilterOp::Gte, 21),
        )
        .sort("-age")
        .limit(10);
    let page = db
        .collection("users")
        .list(&options)
        .await
        .expect("list must succeed");

    assert_eq!(page.len(), 1);
    assert_eq!(page.meta.total, 30);
    assert!(page.meta.has_more);
    assert_eq!(
        server.last_request().uri,
        "/v1/users?filter[role]=admin&filter[age][gte]=21&sort=-age&limit=10"
    );
}

#[tokio::test]
async fn patch_variants_use_their_content_types() {
    let server = spawn_server(vec![
        MockResponse::ok(doc("a", json!({"age": 31}))),
        MockResponse::ok(doc("a", json!({"name": "Bob"}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    users
        .patch("a", &json!({"age": 31}))
        .await
        .expect("merge patch must succeed");
    users
        .json_patch("a", &[PatchOperation::replace("/name", "Bob")])
        .await
        .expect("json patch must succeed");

    let requests = server.requests();
    assert_eq!(requests[0].method, Method::PATCH);
    assert_eq!(
        requests[0].header("content-type"),
        Some("application/merge-patch+json")
    );
    assert_eq!(
        requests[1].header("content-type"),
        Some("application/json-patch+json")
    );
    assert_eq!(
        requests[1].json(),
        json!([{"op": "replace", "path": "/name", "value": "Bob"}])
    );
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = spawn_server(vec![MockResponse::no_content()]).await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    db.collection("users")
        .delete("abc123")
        .await
        .expect("delete must succeed");

    assert_eq!(server.hits(), 1);
    assert_eq!(server.last_request().method, Method::DELETE);
}

#[tokio::test]
async fn retries_retryable_statuses_until_success() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", "down"),
        MockResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "boom"),
        MockResponse::ok(doc("abc123", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    let found = db
        .collection("users")
        .get("abc123")
        .await
        .expect("get must succeed after retries");

    assert_eq!(found["_id"], "abc123");
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_last_response() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "first"),
        MockResponse::error(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "second"),
        MockResponse::error(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", "third"),
        MockResponse::ok(doc("never", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(2)).expect("client must build");

    let err = db
        .collection("users")
        .get("abc123")
        .await
        .expect_err("get must fail");

    assert_eq!(server.hits(), 3);
    let api = err.as_api().expect("expected api error");
    assert_eq!(api.status, 502);
    assert_eq!(api.kind, ApiErrorKind::ServerError);
    assert_eq!(api.message, "third");
}

#[tokio::test]
async fn zero_retries_makes_exactly_one_attempt() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", "down"),
        MockResponse::ok(doc("abc123", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(
        API_KEY,
        server.options(0).retry_delays_ms(5_000, 5_000),
    )
    .expect("client must build");

    let started = Instant::now();
    let err = db
        .collection("users")
        .get("abc123")
        .await
        .expect_err("get must fail");

    assert_eq!(server.hits(), 1);
    assert_eq!(err.status(), Some(503));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn backoff_delays_are_slept_between_attempts() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", "down"),
        MockResponse::error(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", "down"),
        MockResponse::ok(doc("abc123", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(2).retry_delays_ms(50, 1_000))
        .expect("client must build");

    let started = Instant::now();
    db.collection("users")
        .get("abc123")
        .await
        .expect("get must succeed after retries");

    assert_eq!(server.hits(), 3);
    // 50ms after the first attempt, 100ms after the second.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn rate_limit_is_retried_then_classified() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "slow"),
        MockResponse::error(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "slow down"),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(1)).expect("client must build");

    let err = db
        .collection("users")
        .get("abc123")
        .await
        .expect_err("get must fail");

    assert_eq!(server.hits(), 2);
    let api = err.as_api().expect("expected api error");
    assert_eq!(api.kind, ApiErrorKind::RateLimited);
    assert_eq!(api.message, "slow down");
}

#[tokio::test]
async fn not_found_is_terminal_and_carries_document_id() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::NOT_FOUND,
        json!({"error": {
            "code": "DOCUMENT_NOT_FOUND",
            "message": "Document not found",
            "details": {"documentId": "missing"}
        }}),
    )])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    let err = db
        .collection("users")
        .get("missing")
        .await
        .expect_err("get must fail");

    assert_eq!(server.hits(), 1);
    match err {
        JsonDbError::Api(api) => {
            assert_eq!(api.code, "DOCUMENT_NOT_FOUND");
            assert_eq!(
                api.kind,
                ApiErrorKind::NotFound {
                    document_id: Some("missing".to_owned())
                }
            );
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_content_after_retry_ends_the_loop() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "boom"),
        MockResponse::no_content(),
        MockResponse::ok(json!({"unexpected": true})),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    let body = db
        .request(Request::delete("/v1/users/abc123"))
        .await
        .expect("request must succeed");

    assert_eq!(body, None);
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn validation_error_lists_field_errors() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::BAD_REQUEST,
        json!({"error": {
            "code": "VALIDATION_FAILED",
            "message": "Schema validation failed",
            "details": {"errors": [
                {"path": "/email", "message": "is required", "keyword": "required"}
            ]}
        }}),
    )])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    let err = db
        .collection("users")
        .create(&json!({"name": "Alice"}))
        .await
        .expect_err("create must fail");

    assert_eq!(server.hits(), 1);
    match err.as_api().map(|api| &api.kind) {
        Some(ApiErrorKind::Validation { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "/email");
            assert_eq!(errors[0].keyword, "required");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn request_timeout_surfaces_transport_error() {
    let server = spawn_server(vec![
        MockResponse::ok(doc("a", json!({}))).with_delay(Duration::from_millis(300))
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0).timeout_ms(30))
        .expect("client must build");

    let err = db
        .collection("users")
        .get("a")
        .await
        .expect_err("request must timeout");

    match err {
        JsonDbError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("expected transport timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_attempt_is_retried() {
    let server = spawn_server(vec![
        MockResponse::ok(doc("slow", json!({}))).with_delay(Duration::from_millis(300)),
        MockResponse::ok(doc("fast", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(1).timeout_ms(50))
        .expect("client must build");

    let found = db
        .collection("users")
        .get("a")
        .await
        .expect("retry must succeed");

    assert_eq!(found["_id"], "fast");
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn connection_refused_surfaces_transport_error_after_retries() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("must bind");
    let address = listener.local_addr().expect("must have local addr");
    drop(listener);

    let options = ClientOptions::default()
        .base_url(format!("http://{address}"))
        .max_retries(2)
        .retry_delays_ms(1, 2);
    let db = JsonDb::with_options(API_KEY, options).expect("client must build");

    let err = db
        .collection("users")
        .get("a")
        .await
        .expect_err("request must fail");

    match err {
        JsonDbError::Transport(inner) => assert!(inner.is_connect()),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_headers_are_sent_but_cannot_override_authorization() {
    let server = spawn_server(vec![MockResponse::ok(doc("a", json!({})))]).await;
    let options = server
        .options(0)
        .header("X-Custom", "value")
        .header("Authorization", "Basic nope");
    let db = JsonDb::with_options(API_KEY, options).expect("client must build");

    db.request(Request::get("/v1/users/a").header("X-Trace", "t-1"))
        .await
        .expect("request must succeed");

    let request = server.last_request();
    assert_eq!(request.header("x-custom"), Some("value"));
    assert_eq!(request.header("x-trace"), Some("t-1"));
    assert_eq!(
        request.header("authorization"),
        Some(format!("Bearer {API_KEY}").as_str())
    );
}

#[tokio::test]
async fn ids_and_filter_values_are_percent_encoded() {
    let server = spawn_server(vec![
        MockResponse::no_content(),
        MockResponse::ok(json!({"data": [], "meta": {"total": 0, "limit": 5, "offset": 0, "hasMore": false}})),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    users.delete("a#b").await.expect("delete must succeed");
    users
        .list(&ListOptions::new().filter(Filter::new().eq("company", "AT&T")).limit(5))
        .await
        .expect("list must succeed");

    let requests = server.requests();
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(requests[0].uri, "/v1/users/a%23b");
    assert_eq!(requests[1].uri, "/v1/users?filter[company]=AT%26T&limit=5");
}

#[tokio::test]
async fn relative_request_path_is_rejected_before_sending() {
    let server = spawn_server(vec![MockResponse::ok(doc("a", json!({})))]).await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");

    let err = db
        .request(Request::get("@evil.example/x"))
        .await
        .expect_err("request must be rejected");

    assert!(matches!(err, JsonDbError::Config(_)), "{err:?}");
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn bearer_prefix_in_api_key_is_canonicalized() {
    let server = spawn_server(vec![MockResponse::ok(doc("a", json!({})))]).await;
    let db = JsonDb::with_options(format!("bearer {API_KEY}"), server.options(0))
        .expect("client must build");

    db.collection("users")
        .get("a")
        .await
        .expect("get must succeed");

    assert_eq!(
        server.last_request().header("authorization"),
        Some(format!("Bearer {API_KEY}").as_str())
    );
}

#[tokio::test]
async fn bulk_operations_report_summary() {
    let summary = json!({
        "results": [
            {"status": 201, "_id": "id1", "ok": true},
            {"status": 201, "_id": "id2", "ok": true}
        ],
        "summary": {"total": 2, "succeeded": 2, "failed": 0}
    });
    let server = spawn_server(vec![
        MockResponse::ok(summary.clone()),
        MockResponse::ok(summary),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    let created = users
        .bulk_create(&[json!({"name": "Charlie"}), json!({"name": "Dana"})])
        .await
        .expect("bulk create must succeed");
    users
        .bulk(&[
            BulkOperation::replace("id1", json!({"name": "Carl"})),
            BulkOperation::delete("old-doc"),
        ])
        .await
        .expect("bulk must succeed");

    assert_eq!(created.summary.succeeded, 2);
    assert_eq!(created.results.len(), 2);
    let requests = server.requests();
    assert_eq!(requests[0].uri, "/v1/users/_bulk");
    assert_eq!(
        requests[0].json(),
        json!({"operations": [
            {"method": "POST", "body": {"name": "Charlie"}},
            {"method": "POST", "body": {"name": "Dana"}}
        ]})
    );
    assert_eq!(
        requests[1].json(),
        json!({"operations": [
            {"method": "PUT", "id": "id1", "body": {"name": "Carl"}},
            {"method": "DELETE", "id": "old-doc"}
        ]})
    );
}

#[tokio::test]
async fn count_and_list_collections() {
    let server = spawn_server(vec![
        MockResponse::ok(json!({"count": 5})),
        MockResponse::ok(json!({"data": ["users", "posts"]})),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");

    let count = db
        .collection("users")
        .count(Some(&Filter::new().eq("role", "admin")))
        .await
        .expect("count must succeed");
    let names = db
        .list_collections()
        .await
        .expect("list collections must succeed");

    assert_eq!(count, 5);
    assert_eq!(names, vec!["users".to_owned(), "posts".to_owned()]);
    let requests = server.requests();
    assert_eq!(requests[0].uri, "/v1/users?filter[role]=admin&count=true");
    assert_eq!(requests[1].uri, "/v1");
}

#[tokio::test]
async fn schema_lifecycle() {
    let schema = json!({"type": "object", "required": ["name"]});
    let server = spawn_server(vec![
        MockResponse::ok(json!({"collection": "users", "schema": schema.clone()})),
        MockResponse::ok(json!({"collection": "users", "schema": schema.clone()})),
        MockResponse::ok(json!({"collection": "users", "valid": true, "errors": []})),
        MockResponse::ok(json!({"collection": "users", "schema": null})),
        MockResponse::ok(json!({"collection": "users", "schema": null})),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    users.set_schema(&schema).await.expect("set must succeed");
    let current = users.get_schema().await.expect("get must succeed");
    let verdict = users
        .validate(&json!({"name": "Alice"}))
        .await
        .expect("validate must succeed");
    users.remove_schema().await.expect("remove must succeed");
    let removed = users.get_schema().await.expect("get must succeed");

    assert_eq!(current, Some(schema));
    assert_eq!(verdict["valid"], true);
    assert_eq!(removed, None);
    let requests = server.requests();
    assert_eq!(requests[0].method, Method::PUT);
    assert_eq!(requests[0].uri, "/v1/users/_schema");
    assert_eq!(requests[2].uri, "/v1/users/_validate");
    assert_eq!(requests[3].method, Method::DELETE);
}

#[tokio::test]
async fn version_history_paths() {
    let server = spawn_server(vec![
        MockResponse::ok(json!({"versions": [{"version": 1, "action": "create"}]})),
        MockResponse::ok(json!({"_id": "doc1", "name": "old", "$version": 1})),
        MockResponse::ok(json!({"_id": "doc1", "name": "restored", "$version": 3})),
        MockResponse::ok(json!({"changed": {"name": {"from": "a", "to": "b"}}})),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    let versions = users.list_versions("doc1").await.expect("must list");
    let old = users.get_version("doc1", 1).await.expect("must get");
    let restored = users.restore_version("doc1", 1).await.expect("must restore");
    let diff = users.diff_versions("doc1", 1, 2).await.expect("must diff");

    assert_eq!(versions["versions"].as_array().map(Vec::len), Some(1));
    assert_eq!(old["name"], "old");
    assert_eq!(restored["name"], "restored");
    assert_eq!(diff["changed"]["name"]["to"], "b");
    let uris = server
        .requests()
        .into_iter()
        .map(|request| request.uri)
        .collect::<Vec<_>>();
    assert_eq!(
        uris,
        vec![
            "/v1/users/doc1/versions",
            "/v1/users/doc1/versions/1",
            "/v1/users/doc1/versions/1/restore",
            "/v1/users/doc1/versions/diff?from=1&to=2",
        ]
    );
}

#[tokio::test]
async fn webhook_management() {
    let server = spawn_server(vec![
        MockResponse::json(
            StatusCode::CREATED,
            json!({"_id": "wh1", "url": "https://example.com/hook", "status": "active"}),
        ),
        MockResponse::ok(json!({"data": [{"_id": "wh1"}]})),
        MockResponse::ok(json!({"_id": "wh1", "recentDeliveries": []})),
        MockResponse::ok(json!({"_id": "wh1", "url": "https://new.com/hook"})),
        MockResponse::ok(json!({"_id": "del1", "statusCode": 200})),
        MockResponse::no_content(),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    let created = users
        .create_webhook(&WebhookConfig::new(
            "https://example.com/hook",
            ["document.created"],
        ))
        .await
        .expect("must create");
    users.list_webhooks().await.expect("must list");
    users.get_webhook("wh1").await.expect("must get");
    let updated = users
        .update_webhook(
            "wh1",
            &WebhookUpdate {
                url: Some("https://new.com/hook".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("must update");
    let delivery = users.test_webhook("wh1").await.expect("must test");
    users.delete_webhook("wh1").await.expect("must delete");

    assert_eq!(created["_id"], "wh1");
    assert_eq!(updated["url"], "https://new.com/hook");
    assert_eq!(delivery["statusCode"], 200);
    let requests = server.requests();
    assert_eq!(
        requests[0].json(),
        json!({"url": "https://example.com/hook", "events": ["document.created"]})
    );
    assert_eq!(requests[3].method, Method::PUT);
    assert_eq!(requests[3].json(), json!({"url": "https://new.com/hook"}));
    assert_eq!(requests[4].uri, "/v1/users/_webhooks/wh1/test");
    assert_eq!(requests[5].method, Method::DELETE);
}

#[tokio::test]
async fn import_and_export() {
    let server = spawn_server(vec![
        MockResponse::json(
            StatusCode::MULTI_STATUS,
            json!({"results": [{"status": 201, "document": {"_id": "d1"}}]}),
        ),
        MockResponse::ok(json!([{"_id": "d1", "name": "Alice"}])),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(0)).expect("client must build");
    let users = db.collection("users");

    let imported = users
        .import_documents(
            &[json!({"name": "Alice"})],
            &ImportOptions {
                on_conflict: Some("skip".to_owned()),
                id_field: None,
            },
        )
        .await
        .expect("import must succeed");
    let exported = users
        .export_documents(Some(&Filter::new().eq("name", "Alice")))
        .await
        .expect("export must succeed");

    assert_eq!(imported["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(exported.len(), 1);
    let requests = server.requests();
    assert_eq!(requests[0].uri, "/v1/users/_import?onConflict=skip");
    assert_eq!(requests[0].json(), json!([{"name": "Alice"}]));
    assert_eq!(requests[1].uri, "/v1/users/_export?filter[name]=Alice");
}

#[tokio::test]
async fn concurrent_requests_retry_independently() {
    let server = spawn_server(vec![
        MockResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "boom"),
        MockResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "boom"),
        MockResponse::ok(doc("x", json!({}))),
        MockResponse::ok(doc("x", json!({}))),
    ])
    .await;
    let db = JsonDb::with_options(API_KEY, server.options(3)).expect("client must build");
    let users = db.collection("users");

    let (first, second) = tokio::join!(users.get("x"), users.get("x"));

    first.expect("first request must succeed");
    second.expect("second request must succeed");
    assert_eq!(server.hits(), 4);
}
