//! Round trips against real servers.
//!
//! Ignored by default. Point them at disposable servers with, for example:
//!
//! ```text
//! TEST_MYSQL_HOST=127.0.0.1 TEST_MYSQL_USER=root TEST_MYSQL_PASSWORD=secret \
//! TEST_POSTGRES_HOST=127.0.0.1 TEST_POSTGRES_USER=postgres TEST_POSTGRES_PASSWORD=secret \
//!     cargo test -p console-service --test live -- --ignored
//! ```

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::config::AppConfig;
use console_service::{create_router, AppState};

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json");
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 16 * 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Connect parameters from `TEST_<PREFIX>_*`, or `None` when unset.
fn connect_body(db_type: &str, prefix: &str) -> Option<Value> {
    let var = |name: &str| std::env::var(format!("TEST_{prefix}_{name}")).ok();
    let host = var("HOST")?;
    Some(json!({
        "type": db_type,
        "host": host,
        "port": var("PORT"),
        "username": var("USER"),
        "password": var("PASSWORD"),
        "database": var("DATABASE").unwrap_or_default(),
    }))
}

async fn database_round_trip(db_type: &str, prefix: &str) {
    let Some(body) = connect_body(db_type, prefix) else {
        eprintln!("TEST_{prefix}_HOST not set, skipping");
        return;
    };

    let app = create_router(AppState::new(AppConfig::default()));
    let cookie = "sql_console_sid=live_round_trip";
    let name = format!("console_live_{}", std::process::id());

    let (status, res) = call(&app, Method::POST, "/api/test-connection", cookie, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert!(res["info"]["version"].is_string());

    let (status, res) = call(&app, Method::POST, "/api/databases", cookie, Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::OK, "{res}");

    let (_, res) = call(&app, Method::GET, "/api/databases", cookie, None).await;
    let listed: Vec<&str> = res["databases"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(listed.contains(&name.as_str()), "{listed:?}");

    let (status, res) = call(&app, Method::POST, "/api/query", cookie, Some(json!({"query": "SELECT 1 AS x"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["rows"], json!([{"x": 1}]));

    let uri = format!("/api/databases/{name}");
    let (status, res) = call(&app, Method::DELETE, &uri, cookie, None).await;
    assert_eq!(status, StatusCode::OK, "{res}");

    let (status, _) = call(&app, Method::POST, "/api/disconnect", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn test_mysql_database_round_trip() {
    database_round_trip("mysql", "MYSQL").await;
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_postgres_database_round_trip() {
    database_round_trip("postgresql", "POSTGRES").await;
}
