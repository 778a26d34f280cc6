//! Connect failures through the real sqlx connector.
//!
//! Nothing listens on the ports used here, so the driver's refusal must come
//! back promptly instead of waiting out the connect timeout.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::config::AppConfig;
use common::errors::AppError;
use common::models::{ConnectionParams, DbType};
use console_service::backends::{Connector, SqlxConnector};
use console_service::{create_router, AppState};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROMPT: Duration = Duration::from_secs(5);

/// A local port that was free a moment ago.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn refused_params() -> ConnectionParams {
    ConnectionParams {
        host: Some("127.0.0.1".into()),
        port: Some(closed_port()),
        username: Some("root".into()),
        database: None,
    }
}

async fn assert_refused_promptly(db_type: DbType) {
    let connector = SqlxConnector::new(CONNECT_TIMEOUT);
    let started = Instant::now();

    let err = match connector
        .connect(db_type, &refused_params(), Some("secret"))
        .await
    {
        Ok(_) => panic!("{db_type} connect to a closed port succeeded"),
        Err(e) => e,
    };

    assert!(started.elapsed() < PROMPT, "{db_type} took {:?}", started.elapsed());
    assert!(matches!(err, AppError::DatabaseConnection(_)), "{err:?}");
    let message = err.to_string();
    assert!(message.starts_with("Connection failed: "), "{message}");
    assert!(!message.contains("pool timed out"), "{message}");
    assert!(!message.contains("timed out after"), "{message}");
}

#[tokio::test]
async fn test_mysql_refused_connection_fails_fast() {
    assert_refused_promptly(DbType::MySQL).await;
}

#[tokio::test]
async fn test_mariadb_refused_connection_fails_fast() {
    assert_refused_promptly(DbType::MariaDB).await;
}

#[tokio::test]
async fn test_postgres_refused_connection_fails_fast() {
    assert_refused_promptly(DbType::PostgreSQL).await;
}

async fn post_connect(body: Value) -> (StatusCode, Value) {
    let app = create_router(AppState::new(AppConfig::default()));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/test-connection")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_refused_connection_is_500_with_driver_text() {
    for db_type in ["mysql", "postgresql"] {
        let started = Instant::now();
        let (status, body) = post_connect(json!({
            "type": db_type,
            "host": "127.0.0.1",
            "port": closed_port().to_string(),
            "username": "root",
            "password": "secret",
        }))
        .await;

        assert!(started.elapsed() < PROMPT, "{db_type} took {:?}", started.elapsed());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
        assert_eq!(body["success"], false);
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Connection failed: "), "{message}");
        assert!(!message.contains("pool timed out"), "{message}");
    }
}

#[tokio::test]
async fn test_sqlite_path_in_missing_directory_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("dir").join("console.db");

    let (status, body) = post_connect(json!({
        "type": "sqlite",
        "database": path.to_string_lossy(),
    }))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Connection failed: "));
    assert!(!path.exists());
}
