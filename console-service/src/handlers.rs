//! Handler模块

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::extract::ApiJson;
use common::middleware::SessionId;
use common::models::{
    CreateDatabaseRequest, CreateUserRequest, DatabaseList, DropUserParams, QueryRequest,
    QueryResult, TestConnectionData, TestConnectionRequest, UserList,
};
use common::response::{ApiResponse, EmptyData};

use crate::service::{ConsoleService, ConsoleServiceTrait};
use crate::state::AppState;

/// 测试并建立会话连接
#[utoipa::path(
    post,
    path = "/api/test-connection",
    tag = "connection",
    request_body = TestConnectionRequest,
    responses(
        (status = 200, description = "连接成功", body = ApiResponse<TestConnectionData>),
        (status = 400, description = "不支持的数据库类型", body = ApiResponse<EmptyData>),
        (status = 500, description = "连接失败", body = ApiResponse<EmptyData>)
    )
)]
pub async fn test_connection(
    State(state): State<AppState>,
    session: SessionId,
    ApiJson(req): ApiJson<TestConnectionRequest>,
) -> Result<Json<ApiResponse<TestConnectionData>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let info = service.connect(session.as_str(), req).await?;
    Ok(Json(ApiResponse::ok_with_message(
        TestConnectionData { info },
        "Connection successful!",
    )))
}

/// 断开会话连接
#[utoipa::path(
    post,
    path = "/api/disconnect",
    tag = "connection",
    responses(
        (status = 200, description = "已断开", body = ApiResponse<EmptyData>)
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
    session: SessionId,
) -> Json<ApiResponse<EmptyData>> {
    let service = ConsoleService::new(state.registry);
    service.disconnect(session.as_str()).await;
    Json(ApiResponse::message("Disconnected successfully"))
}

/// 列出数据库
#[utoipa::path(
    get,
    path = "/api/databases",
    tag = "databases",
    responses(
        (status = 200, description = "数据库列表", body = ApiResponse<DatabaseList>),
        (status = 400, description = "没有活动连接", body = ApiResponse<EmptyData>)
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<ApiResponse<DatabaseList>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let databases = service.list_databases(session.as_str()).await?;
    Ok(Json(ApiResponse::ok(DatabaseList { databases })))
}

/// 创建数据库
#[utoipa::path(
    post,
    path = "/api/databases",
    tag = "databases",
    request_body = CreateDatabaseRequest,
    responses(
        (status = 200, description = "数据库已创建", body = ApiResponse<EmptyData>),
        (status = 400, description = "名称非法或引擎不支持", body = ApiResponse<EmptyData>)
    )
)]
pub async fn create_database(
    State(state): State<AppState>,
    session: SessionId,
    ApiJson(req): ApiJson<CreateDatabaseRequest>,
) -> Result<Json<ApiResponse<EmptyData>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let name = service.create_database(session.as_str(), req).await?;
    Ok(Json(ApiResponse::message(format!(
        "Database '{name}' created successfully"
    ))))
}

/// 删除数据库
#[utoipa::path(
    delete,
    path = "/api/databases/{name}",
    tag = "databases",
    params(
        ("name" = String, Path, description = "数据库名")
    ),
    responses(
        (status = 200, description = "数据库已删除", body = ApiResponse<EmptyData>),
        (status = 400, description = "名称非法或引擎不支持", body = ApiResponse<EmptyData>)
    )
)]
pub async fn drop_database(
    State(state): State<AppState>,
    session: SessionId,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<EmptyData>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let name = service.drop_database(session.as_str(), name).await?;
    Ok(Json(ApiResponse::message(format!(
        "Database '{name}' deleted successfully"
    ))))
}

/// 列出用户
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "用户列表", body = ApiResponse<UserList>),
        (status = 400, description = "没有活动连接或引擎不支持", body = ApiResponse<EmptyData>)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    session: SessionId,
) -> Result<Json<ApiResponse<UserList>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let users = service.list_users(session.as_str()).await?;
    Ok(Json(ApiResponse::ok(UserList { users })))
}

/// 创建用户
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "用户已创建", body = ApiResponse<EmptyData>),
        (status = 400, description = "用户名非法或引擎不支持", body = ApiResponse<EmptyData>)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    session: SessionId,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<Json<ApiResponse<EmptyData>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let username = service.create_user(session.as_str(), req).await?;
    Ok(Json(ApiResponse::message(format!(
        "User '{username}' created successfully"
    ))))
}

/// 删除用户
#[utoipa::path(
    delete,
    path = "/api/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "用户名"),
        DropUserParams
    ),
    responses(
        (status = 200, description = "用户已删除", body = ApiResponse<EmptyData>),
        (status = 400, description = "用户名非法或引擎不支持", body = ApiResponse<EmptyData>)
    )
)]
pub async fn drop_user(
    State(state): State<AppState>,
    session: SessionId,
    Path(username): Path<String>,
    Query(params): Query<DropUserParams>,
) -> Result<Json<ApiResponse<EmptyData>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let username = service
        .drop_user(session.as_str(), username, params.host)
        .await?;
    Ok(Json(ApiResponse::message(format!(
        "User '{username}' deleted successfully"
    ))))
}

/// 执行即席 SQL
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "执行结果", body = ApiResponse<QueryResult>),
        (status = 400, description = "查询为空或没有活动连接", body = ApiResponse<EmptyData>),
        (status = 500, description = "驱动报错", body = ApiResponse<EmptyData>)
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    session: SessionId,
    ApiJson(req): ApiJson<QueryRequest>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    let service = ConsoleService::new(state.registry);
    let result = service.execute_query(session.as_str(), req).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connections: state.registry.len().await,
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 活跃会话连接数
    pub connections: usize,
}
