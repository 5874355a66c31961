//! API integration tests

use axum::body::Body;
use placerly::auth::{Session, SessionTokens};
use placerly::directory::{IdentityDirectory, SqliteDirectory};
use placerly::models::{Account, NewAccount, Role};
use placerly::notify::{Email, NotificationGateway};
use placerly::token::SigningKey;
use placerly::{http, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct NullMailer;

#[async_trait::async_trait]
impl NotificationGateway for NullMailer {
    async fn send(&self, _email: Email) -> placerly::error::Result<()> {
        Ok(())
    }
}

async fn setup_app() -> (axum::Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(
        pool.clone(),
        SECRET,
        "https://app.placerly.example",
        Arc::new(NullMailer),
    );

    (http::router(state), pool)
}

async fn create_account(pool: &SqlitePool, name: &str, email: &str, role: Role) -> Account {
    SqliteDirectory::new(pool.clone())
        .create(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            role,
            password: "pw".to_string(),
        })
        .await
        .expect("Failed to create account")
}

fn bearer_for(account: &Account) -> String {
    SessionTokens::new(SigningKey::new(SECRET)).issue(&Session {
        user_id: account.id,
        role: account.role,
        email: account.email.clone(),
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), hyper::StatusCode::OK);
}

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .uri("/executors")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_bearer_is_unauthorized() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .uri("/executors")
                .header("authorization", "Bearer nonsense")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_body_carries_kind_and_message() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .method("POST")
                .uri("/executors/invite")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "action": "accept", "token": "garbage" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), hyper::StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "invalid_token");
    assert_eq!(body["message"], "Invalid or expired invite token");
}

#[tokio::test]
async fn test_create_executor_requires_valid_body() {
    let (app, pool) = setup_app().await;
    let account = create_account(&pool, "John Smith", "john@example.com", Role::User).await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .method("POST")
                .uri("/executors")
                .header("authorization", format!("Bearer {}", bearer_for(&account)))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "name": "Jo", "email": "exec@example.com" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), hyper::StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_unknown_record_category_is_rejected() {
    let (app, pool) = setup_app().await;
    let account = create_account(&pool, "John Smith", "john@example.com", Role::User).await;

    let response = app
        .oneshot(
            hyper::Request::builder()
                .uri("/records/crypto")
                .header("authorization", format!("Bearer {}", bearer_for(&account)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_app_state_new() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let state = AppState::new(
        pool,
        SECRET,
        "https://app.placerly.example",
        Arc::new(NullMailer),
    );
    assert_eq!(std::sync::Arc::strong_count(&state), 1);
}
