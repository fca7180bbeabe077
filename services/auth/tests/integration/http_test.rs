use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use secrecy::SecretString;
use uuid::Uuid;

use cinevault_auth::infra::mail::{SmtpMailSender, SmtpSettings};
use cinevault_auth::infra::provider::TmdbProviderClient;
use cinevault_auth::router::build_router;
use cinevault_auth::state::AppState;
use cinevault_auth_schema::users;
use cinevault_auth_types::password::PasswordHasher;
use cinevault_auth_types::token::{TokenCodec, TokenSubject};

use crate::helpers::TEST_JWT_SECRET;

/// Router over a scripted database and adapters that point nowhere: Redis,
/// SMTP and the provider are unreachable.
fn test_server() -> (TestServer, Arc<TokenCodec>) {
    test_server_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

fn database_down() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection refused".to_owned())])
        .into_connection()
}

fn test_server_with(db: DatabaseConnection) -> (TestServer, Arc<TokenCodec>) {
    let codec = Arc::new(TokenCodec::hmac(TEST_JWT_SECRET, 3600).unwrap());
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db,
        redis,
        token_codec: Arc::clone(&codec),
        password_hasher: PasswordHasher::new().unwrap(),
        provider: TmdbProviderClient::new(
            "http://127.0.0.1:1/3/",
            SecretString::from("key"),
            Duration::from_millis(200),
        )
        .unwrap(),
        mailer: SmtpMailSender::new(&SmtpSettings {
            host: "127.0.0.1".to_owned(),
            port: 1,
            credentials: None,
            from: "Cinevault <no-reply@cinevault.test>".to_owned(),
        })
        .unwrap(),
        reset_code_ttl_secs: 900,
        provider_session_ttl_secs: 3600,
        cache_key_secret: SecretString::from("cache-key-secret"),
    };
    (TestServer::new(build_router(state)).unwrap(), codec)
}

fn issue(codec: &TokenCodec, user_id: Uuid) -> String {
    codec
        .issue(&TokenSubject {
            user_id,
            email: "ada@example.com",
            role: 0,
        })
        .unwrap()
        .token
}

// ── GET /api/v1/authentication/token ─────────────────────────────────────────

#[tokio::test]
async fn should_return_claims_for_valid_bearer_token() {
    let (server, codec) = test_server();
    let user_id = Uuid::new_v4();
    let token = issue(&codec, user_id);

    let response = server
        .get("/api/v1/authentication/token")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["email"], "ada@example.com");
    let expires = response.header("x-cinevault-token-expires");
    assert_eq!(expires.to_str().unwrap(), body["expires_at"].to_string());
}

#[tokio::test]
async fn should_reject_token_from_other_key() {
    let (server, _) = test_server();
    let other = TokenCodec::hmac(b"another-secret", 3600).unwrap();
    let token = issue(&other, Uuid::new_v4());

    let response = server
        .get("/api/v1/authentication/token")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_SIGNATURE");
}

#[tokio::test]
async fn should_reject_missing_bearer_as_malformed() {
    let (server, _) = test_server();

    let response = server.get("/api/v1/authentication/token").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "MALFORMED");
}

// ── Boundary behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_attach_request_id() {
    let (server, _) = test_server();

    let response = server.get("/healthz").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let id = response.header("x-request-id");
    assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn should_report_not_ready_when_dependencies_are_down() {
    let (server, _) = test_server();

    let response = server.get("/readyz").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn should_reject_invalid_registration_before_storage() {
    let (server, _) = test_server();

    let response = server
        .post("/api/v1/authentication/register")
        .json(&serde_json::json!({
            "email": "not-an-email",
            "password": "secret123",
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_INPUT");
}

#[tokio::test]
async fn should_register_without_display_names() {
    let stored = users::Model {
        id: Uuid::now_v7(),
        email: "a@x.com".to_owned(),
        password_hash: "$argon2id$stub".to_owned(),
        first_name: None,
        last_name: None,
        role: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .append_query_results([vec![stored]])
        .into_connection();
    let (server, _) = test_server_with(db);

    let response = server
        .post("/api/v1/authentication/register")
        .json(&serde_json::json!({ "email": "a@x.com", "password": "secret123" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "a@x.com");
    assert!(body["first_name"].is_null());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn should_accept_reset_request_for_unknown_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();
    let (server, _) = test_server_with(db);

    let response = server
        .post("/api/v1/authentication/reset-password")
        .json(&serde_json::json!({ "email": "nobody@example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn should_surface_failed_reset_lookup() {
    let (server, _) = test_server_with(database_down());

    let response = server
        .post("/api/v1/authentication/reset-password")
        .json(&serde_json::json!({ "email": "ada@example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn should_hide_upstream_detail_from_client() {
    let (server, _) = test_server();

    let response = server
        .post("/api/v1/authentication/create-session")
        .json(&serde_json::json!({ "request_token": "tok-1" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["message"], "upstream service unavailable");
}
