//! 控制台路由模块

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    create_database, create_user, disconnect, drop_database, drop_user, execute_query,
    health_check, list_databases, list_users, test_connection,
};
use crate::state::AppState;

/// 创建控制台 API 路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/test-connection", post(test_connection))
        .route("/api/disconnect", post(disconnect))
        .route("/api/databases", get(list_databases).post(create_database))
        .route("/api/databases/{name}", delete(drop_database))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{username}", delete(drop_user))
        .route("/api/query", post(execute_query))
        .route("/api/health", get(health_check))
}
