//! SQL 控制台服务
//!
//! 为浏览器端 SQL 控制台提供 HTTP/JSON 接口：
//! - 按会话建立/断开数据库连接（MySQL、MariaDB、PostgreSQL、SQLite）
//! - 数据库与用户管理
//! - 即席 SQL 执行

pub mod backends;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod service;
pub mod state;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::{request_id_middleware, session_middleware, SessionConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SQL 控制台 API",
        version = "0.1.0",
        description = "浏览器 SQL 控制台后端"
    ),
    paths(
        handlers::test_connection,
        handlers::disconnect,
        handlers::list_databases,
        handlers::create_database,
        handlers::drop_database,
        handlers::list_users,
        handlers::create_user,
        handlers::drop_user,
        handlers::execute_query,
        handlers::health_check,
    ),
    components(schemas(
        common::models::DbType,
        common::models::TestConnectionRequest,
        common::models::ConnectionInfo,
        common::models::CreateDatabaseRequest,
        common::models::CreateUserRequest,
        common::models::UserItem,
        common::models::QueryRequest,
        common::models::QueryResult,
        handlers::HealthResponse,
    )),
    tags(
        (name = "connection", description = "会话连接端点"),
        (name = "databases", description = "数据库管理端点"),
        (name = "users", description = "用户管理端点"),
        (name = "query", description = "SQL 执行端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

/// 创建完整的应用路由（含中间件）
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let session = SessionConfig::from(&state.config);

    let mut router = Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json));

    // 前端静态资源
    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(middleware::from_fn_with_state(session, session_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
