// Integration tests for the Daybook API
// Run with: cargo test -p daybook-server --test integration_test
// Drives the full router in-process against the in-memory storage engine,
// so no database or running server is required.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use daybook_server::auth::config::{AdminConfig, TokenConfig};
use daybook_server::auth::{ensure_bootstrap_admin, AuthConfig, AuthStrategy};
use daybook_storage::{CreateActivity, StorageBackend};

const ADMIN_PASSWORD: &str = "admin-password";
const ADMIN_TOKEN: &str = "admin-opaque-token";

fn test_config(strategy: AuthStrategy) -> AuthConfig {
    AuthConfig {
        strategy,
        token: TokenConfig {
            secret: "integration-test-secret".to_string(),
            lifetime: Duration::from_secs(3600),
        },
        admin: AdminConfig {
            username: "admin".to_string(),
            password: Some(ADMIN_PASSWORD.to_string()),
            token: Some(ADMIN_TOKEN.to_string()),
        },
    }
}

fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("daybook-test-{}", uuid::Uuid::now_v7()))
}

/// Build the app with a seeded admin, returning the store for direct seeding.
async fn spawn_app(strategy: AuthStrategy) -> (Router, Arc<StorageBackend>) {
    spawn_app_with_config(test_config(strategy)).await
}

async fn spawn_app_with_config(config: AuthConfig) -> (Router, Arc<StorageBackend>) {
    let store = Arc::new(StorageBackend::in_memory());
    ensure_bootstrap_admin(&store, &config)
        .await
        .expect("Failed to seed admin");
    let app = daybook_server::build_app(store.clone(), config, temp_upload_dir(), "");
    (app, store)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

async fn send_raw(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("Request failed")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = send_raw(app, req).await;
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body was not JSON")
    };
    (status, body)
}

/// Register and login a user under the signed strategy, returning the token.
async fn signup(app: &Router, username: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": username, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": username, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["access_token"]
        .as_str()
        .expect("No access token in login response")
        .to_string()
}

async fn my_id(app: &Router, token: &str) -> String {
    let (status, body) = send(app, request("GET", "/v1/users/me", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_str().expect("No user id").to_string()
}

// ============================================
// Auth flows
// ============================================

#[tokio::test]
async fn test_signed_auth_workflow() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;

    // Step 1: open registration
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "alice", "password": "wonderland"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_admin"], false);
    // No credential material in the payload
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("token").is_none());

    // Step 2: duplicate username is a conflict
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "alice", "password": "other"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["message"], "username already in use");

    // Step 3: malformed registrations
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "  ", "password": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "bob"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Step 4: wrong password and unknown user read identically
    let (status, wrong_password) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown_user) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "nobody", "password": "nope"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["data"]["message"], unknown_user["data"]["message"]);

    // Step 5: login succeeds, sets an HttpOnly cookie, returns the token
    let response = send_raw(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wonderland"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("No session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["user"]["username"], "alice");
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    // Step 6: the token works via the Authorization header and the cookie
    let (status, body) = send(&app, request("GET", "/v1/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let cookie_req = Request::builder()
        .method("GET")
        .uri("/v1/users/me")
        .header(header::COOKIE, format!("access_token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, cookie_req).await;
    assert_eq!(status, StatusCode::OK);

    // Step 7: no credentials at all
    let (status, body) = send(&app, request("GET", "/v1/users/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["message"], "Authentication required");

    // Step 8: validation is stateless under the signed strategy
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/validate",
            None,
            Some(json!({"token": token})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/validate",
            None,
            Some(json!({"token": "garbage"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["message"], "Invalid or expired token");

    // Step 9: logout clears the cookie
    let response = send_raw(&app, request("POST", "/v1/auth/logout", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("No removal cookie")
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("access_token="));
}

#[tokio::test]
async fn test_stored_auth_workflow() {
    let (app, _store) = spawn_app(AuthStrategy::Stored).await;

    // Step 1: registration requires credentials
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "bob"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Step 2: the seeded admin registers bob with an explicit token
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            Some(ADMIN_TOKEN),
            Some(json!({"username": "bob", "token": "bob-token"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["token"], "bob-token");

    // Step 3: a non-admin may not register anyone
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            Some("bob-token"),
            Some(json!({"username": "carol"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["message"], "Admin access required");

    // Step 4: omitted token means a generated one
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            Some(ADMIN_TOKEN),
            Some(json!({"username": "dave"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let generated = body["data"]["token"].as_str().unwrap();
    assert_eq!(generated.len(), 64);

    // Step 5: there is no password login in this deployment
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "bob", "password": "anything"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["message"], "Password authentication is disabled");

    // Step 6: validation resolves the token to its account
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/validate",
            None,
            Some(json!({"token": "bob-token"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["user"]["username"], "bob");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/auth/validate",
            None,
            Some(json!({"token": "guessed"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Step 7: the stored token authenticates requests directly
    let (status, body) = send(&app, request("GET", "/v1/users/me", Some("bob-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["token"], "bob-token");
}

#[tokio::test]
async fn test_expired_signed_token_rejected() {
    let mut config = test_config(AuthStrategy::Signed);
    config.token.lifetime = Duration::from_secs(0);
    let (app, _store) = spawn_app_with_config(config).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({"username": "alice", "password": "wonderland"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "alice", "password": "wonderland"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    // Zero lifetime: dead on arrival, with the one opaque message
    let (status, body) = send(&app, request("GET", "/v1/users/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["message"], "Invalid or expired token");
}

// ============================================
// Activity ownership
// ============================================

#[tokio::test]
async fn test_activity_ownership_isolation() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let bob = signup(&app, "bob", "builder").await;
    let alice_id = my_id(&app, &alice).await;

    // Step 1: alice creates an activity and becomes its owner
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/activities",
            Some(&alice),
            Some(json!({
                "name": "buy milk",
                "date": "2024-01-01",
                "status": "pending",
                "category_id": 1
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["name"], "buy milk");
    assert_eq!(body["data"]["owner_id"], alice_id.as_str());
    let activity_id = body["data"]["id"].as_str().unwrap().to_string();

    // Step 2: alice sees it in her list, bob does not
    let (_, body) = send(&app, request("GET", "/v1/activities", Some(&alice), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = send(&app, request("GET", "/v1/activities", Some(&bob), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Step 3: every per-row operation reads the same for bob, and the
    // response is indistinguishable from a missing record
    let foreign_uri = format!("/v1/activities/{activity_id}");
    let absent_uri = format!("/v1/activities/{}", uuid::Uuid::now_v7());

    let (status, foreign) = send(&app, request("GET", &foreign_uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, absent) = send(&app, request("GET", &absent_uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(foreign, absent);
    assert_eq!(foreign["data"]["message"], "not found or not accessible");

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &foreign_uri,
            Some(&bob),
            Some(json!({"name": "hijacked"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("{foreign_uri}/status"),
            Some(&bob),
            Some(json!({"status": "done"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request("DELETE", &foreign_uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Step 4: the owner can do all of it
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("{foreign_uri}/status"),
            Some(&alice),
            Some(json!({"status": "done"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "done");
    assert_eq!(body["data"]["owner_id"], alice_id.as_str());

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &foreign_uri,
            Some(&alice),
            Some(json!({"name": "buy milk and eggs"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "buy milk and eggs");
    assert_eq!(body["data"]["date"], "2024-01-01");

    let (status, _) = send(&app, request("DELETE", &foreign_uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, request("GET", &foreign_uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_ignores_supplied_owner() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let bob = signup(&app, "bob", "builder").await;
    let alice_id = my_id(&app, &alice).await;
    let bob_id = my_id(&app, &bob).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/activities",
            Some(&bob),
            Some(json!({
                "name": "sneaky",
                "date": "2024-02-02",
                "status": "pending",
                "category_id": 2,
                "owner_id": alice_id
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["owner_id"], bob_id.as_str());
}

#[tokio::test]
async fn test_admin_bypasses_activity_ownership() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let alice_id = my_id(&app, &alice).await;

    let (_, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "admin", "password": ADMIN_PASSWORD})),
        ),
    )
    .await;
    let admin = body["data"]["access_token"].as_str().unwrap().to_string();

    let (_, body) = send(
        &app,
        request(
            "POST",
            "/v1/activities",
            Some(&alice),
            Some(json!({
                "name": "private",
                "date": "2024-03-03",
                "status": "pending",
                "category_id": 1
            })),
        ),
    )
    .await;
    let activity_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/activities/{activity_id}");

    // Admin reads and patches a foreign record
    let (status, _) = send(&app, request("GET", &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("{uri}/status"),
            Some(&admin),
            Some(json!({"status": "done"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Status-only updates do not move ownership
    assert_eq!(body["data"]["owner_id"], alice_id.as_str());

    // Lists stay owner-scoped even for admins
    let (_, body) = send(&app, request("GET", "/v1/activities", Some(&admin), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unowned_activities_by_strategy() {
    // Stored strategy: unowned rows are shared and claimable
    let (app, store) = spawn_app(AuthStrategy::Stored).await;
    let (_, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/register",
            Some(ADMIN_TOKEN),
            Some(json!({"username": "bob", "token": "bob-token"})),
        ),
    )
    .await;
    let bob_id = body["data"]["id"].as_str().unwrap().to_string();

    let unowned = store
        .create_activity(CreateActivity {
            name: "legacy row".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2023, 5, 5).unwrap(),
            status: "pending".to_string(),
            category_id: 0,
            remark: None,
            address: None,
            owner_id: None,
        })
        .await
        .unwrap();

    let (_, body) = send(&app, request("GET", "/v1/activities", Some("bob-token"), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/v1/activities/{}", unowned.id);
    let (status, body) = send(
        &app,
        request("PUT", &uri, Some("bob-token"), Some(json!({"name": "claimed"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner_id"], bob_id.as_str());

    // Signed strategy: the same shape of row is invisible
    let (app, store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let unowned = store
        .create_activity(CreateActivity {
            name: "legacy row".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2023, 5, 5).unwrap(),
            status: "pending".to_string(),
            category_id: 0,
            remark: None,
            address: None,
            owner_id: None,
        })
        .await
        .unwrap();

    let (_, body) = send(&app, request("GET", "/v1/activities", Some(&alice), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (status, _) = send(
        &app,
        request(
            "GET",
            &format!("/v1/activities/{}", unowned.id),
            Some(&alice),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activity_export_csv() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let bob = signup(&app, "bob", "builder").await;
    let alice_id = my_id(&app, &alice).await;

    for (name, date) in [("buy milk, eggs", "2024-01-02"), ("ride", "2024-01-01")] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/v1/activities",
                Some(&alice),
                Some(json!({
                    "name": name,
                    "date": date,
                    "status": "pending",
                    "category_id": 1
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = send_raw(
        &app,
        request("GET", "/v1/activities/export", Some(&alice), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"activities_{alice_id}.csv\"")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,name,date,status,address,remark,category_id");
    assert_eq!(lines.len(), 3);
    // Newest date first, comma-bearing field quoted
    assert!(lines[1].contains("\"buy milk, eggs\""));
    assert!(lines[2].contains("ride"));

    // Another user's export contains none of it
    let response = send_raw(
        &app,
        request("GET", "/v1/activities/export", Some(&bob), None),
    )
    .await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

// ============================================
// Notes
// ============================================

#[tokio::test]
async fn test_note_privacy() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let bob = signup(&app, "bob", "builder").await;

    // Step 1: alice writes a note
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/v1/notes",
            Some(&alice),
            Some(json!({"title": "groceries", "content": "milk, eggs"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let note_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/notes/{note_id}");

    // Step 2: bob cannot see, update, or delete it, and cannot tell it exists
    let (_, body) = send(&app, request("GET", "/v1/notes", Some(&bob), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (status, body) = send(&app, request("GET", &uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["message"], "not found or not accessible");
    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&bob), Some(json!({"title": "mine now"}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, request("DELETE", &uri, Some(&bob), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Step 3: the owner edits and removes it
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(&alice),
            Some(json!({"content": "milk, eggs, bread"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "groceries");
    assert_eq!(body["data"]["content"], "milk, eggs, bread");

    let (status, _) = send(&app, request("DELETE", &uri, Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, request("GET", "/v1/notes", Some(&alice), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// ============================================
// User management
// ============================================

#[tokio::test]
async fn test_user_management_workflow() {
    let (app, store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let bob = signup(&app, "bob", "builder").await;
    let alice_id = my_id(&app, &alice).await;
    let bob_id = my_id(&app, &bob).await;

    let (_, body) = send(
        &app,
        request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({"username": "admin", "password": ADMIN_PASSWORD})),
        ),
    )
    .await;
    let admin = body["data"]["access_token"].as_str().unwrap().to_string();
    let admin_id = my_id(&app, &admin).await;

    // Step 1: listing users is admin-only
    let (status, body) = send(&app, request("GET", "/v1/users", Some(&alice), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["message"], "Admin access required");

    let (status, body) = send(&app, request("GET", "/v1/users", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user["settings"].is_object());
    }

    // Step 2: self-or-admin updates
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/users/{bob_id}"),
            Some(&alice),
            Some(json!({"username": "hijacked"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["message"], "You may only update your own account");

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/users/{alice_id}"),
            Some(&alice),
            Some(json!({"username": "alice-liddell"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice-liddell");

    // An issued token keeps working across a rename
    let (status, body) = send(&app, request("GET", "/v1/users/me", Some(&alice), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice-liddell");

    // Step 3: empty updates and duplicate names are rejected
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/users/{alice_id}"),
            Some(&alice),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["message"], "no fields to update");

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/users/{alice_id}"),
            Some(&alice),
            Some(json!({"username": "bob"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Step 4: deletion is admin-only and cascades
    let (_, body) = send(
        &app,
        request(
            "POST",
            "/v1/activities",
            Some(&bob),
            Some(json!({
                "name": "doomed",
                "date": "2024-04-04",
                "status": "pending",
                "category_id": 1
            })),
        ),
    )
    .await;
    let bob_activity = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/v1/users/{bob_id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/v1/users/{bob_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "user deleted");

    // The deleted user's session dies with the account
    let (status, _) = send(&app, request("GET", "/v1/users/me", Some(&bob), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // And their rows are gone
    let gone = store
        .get_activity(bob_activity.parse().unwrap())
        .await
        .unwrap();
    assert!(gone.is_none());

    // Step 5: admins are never deletable, not even by themselves
    let (status, body) = send(
        &app,
        request("DELETE", &format!("/v1/users/{admin_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["message"], "Admin accounts cannot be deleted");

    // Step 6: deleting a missing user is a plain 404
    let (status, _) = send(
        &app,
        request(
            "DELETE",
            &format!("/v1/users/{}", uuid::Uuid::now_v7()),
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let (app, store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;
    let alice_id = my_id(&app, &alice).await;

    // Fresh accounts read as an empty object
    let (status, body) = send(
        &app,
        request("GET", "/v1/users/me/settings", Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    // Structured in, structured out
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/v1/users/me/settings",
            Some(&alice),
            Some(json!({"theme": "dark", "page_size": 20})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"], json!({"theme": "dark", "page_size": 20}));

    let (_, body) = send(
        &app,
        request("GET", "/v1/users/me/settings", Some(&alice), None),
    )
    .await;
    assert_eq!(body["data"], json!({"theme": "dark", "page_size": 20}));

    // The generic user update replaces the whole object
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/v1/users/{alice_id}"),
            Some(&alice),
            Some(json!({"settings": {"theme": "light"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"], json!({"theme": "light"}));

    // Malformed stored text degrades to {} instead of failing the request
    store
        .update_user(
            alice_id.parse().unwrap(),
            daybook_storage::UpdateUser {
                settings: Some("{not json".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let (status, body) = send(
        &app,
        request("GET", "/v1/users/me/settings", Some(&alice), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));

    // A non-object settings body is a client error
    let response = send_raw(
        &app,
        request(
            "PUT",
            "/v1/users/me/settings",
            Some(&alice),
            Some(json!([1, 2, 3])),
        ),
    )
    .await;
    assert!(response.status().is_client_error());
}

// ============================================
// Uploads
// ============================================

#[tokio::test]
async fn test_upload_workflow() {
    let upload_dir = temp_upload_dir();
    let store = Arc::new(StorageBackend::in_memory());
    let config = test_config(AuthStrategy::Signed);
    ensure_bootstrap_admin(&store, &config).await.unwrap();
    let app = daybook_server::build_app(store, config, upload_dir.clone(), "");

    let alice = signup(&app, "alice", "wonderland").await;

    let boundary = "daybook-test-boundary";
    let multipart_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"pic.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fake png bytes\r\n\
         --{boundary}--\r\n"
    );

    let req = Request::builder()
        .method("POST")
        .uri("/v1/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {alice}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body.clone()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.ends_with(".png"));
    let filename = url.rsplit('/').next().unwrap();
    // 8 random bytes as hex, plus the original extension
    assert_eq!(filename.len(), "0123456789abcdef.png".len());

    let stored = std::fs::read(upload_dir.join(filename)).unwrap();
    assert_eq!(stored, b"fake png bytes");

    // Uploads require authentication
    let req = Request::builder()
        .method("POST")
        .uri("/v1/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A multipart body without a file field is a validation error
    let empty_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         value\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/v1/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {alice}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(empty_body))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    std::fs::remove_dir_all(&upload_dir).ok();
}

// ============================================
// Envelope and docs
// ============================================

#[tokio::test]
async fn test_error_envelope_shape() {
    let (app, _store) = spawn_app(AuthStrategy::Signed).await;
    let alice = signup(&app, "alice", "wonderland").await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/v1/activities/{}", uuid::Uuid::now_v7()),
            Some(&alice),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"status": 404, "data": {"message": "not found or not accessible"}})
    );
}

#[tokio::test]
async fn test_openapi_spec() {
    let json = daybook_server::openapi::ApiDoc::to_json();
    let spec: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(spec["info"]["title"], "Daybook API");
    assert!(spec["paths"]["/v1/activities"].is_object());
    assert!(spec["paths"]["/v1/notes/{note_id}"].is_object());
    assert!(spec["paths"]["/v1/uploads"].is_object());
}
