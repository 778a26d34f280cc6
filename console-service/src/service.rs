//! 控制台服务模块
//!
//! 每个操作的检查顺序一致：会话连接 → 参数校验 → 引擎能力 → 驱动调用。

use std::sync::Arc;

use async_trait::async_trait;

use common::errors::{AppError, AppResult};
use common::extract::validate_request;
use common::models::{
    ConnectionInfo, CreateDatabaseRequest, CreateUserRequest, DbType, QueryRequest, QueryResult,
    TestConnectionRequest, UserItem,
};
use common::utils::Identifier;

use crate::registry::{ConnectionEntry, ConnectionRegistry};

const INVALID_DATABASE_NAME: &str = "Invalid database name";
const INVALID_USERNAME: &str = "Invalid username";

/// 控制台服务 Trait
#[async_trait]
pub trait ConsoleServiceTrait: Send + Sync {
    /// 建立会话连接（替换已有连接）
    async fn connect(&self, session_id: &str, req: TestConnectionRequest)
        -> AppResult<ConnectionInfo>;

    /// 断开会话连接
    async fn disconnect(&self, session_id: &str);

    /// 列出数据库
    async fn list_databases(&self, session_id: &str) -> AppResult<Vec<String>>;

    /// 创建数据库，返回数据库名
    async fn create_database(&self, session_id: &str, req: CreateDatabaseRequest)
        -> AppResult<String>;

    /// 删除数据库
    async fn drop_database(&self, session_id: &str, name: String) -> AppResult<String>;

    /// 列出用户
    async fn list_users(&self, session_id: &str) -> AppResult<Vec<UserItem>>;

    /// 创建用户，返回用户名
    async fn create_user(&self, session_id: &str, req: CreateUserRequest) -> AppResult<String>;

    /// 删除用户
    async fn drop_user(
        &self,
        session_id: &str,
        username: String,
        host: Option<String>,
    ) -> AppResult<String>;

    /// 执行即席 SQL
    async fn execute_query(&self, session_id: &str, req: QueryRequest) -> AppResult<QueryResult>;
}

/// 控制台服务
pub struct ConsoleService {
    registry: Arc<ConnectionRegistry>,
}

impl ConsoleService {
    /// 创建新的服务实例
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    async fn active(&self, session_id: &str) -> AppResult<Arc<ConnectionEntry>> {
        self.registry
            .get(session_id)
            .await
            .ok_or(AppError::NoActiveConnection)
    }
}

fn identifier(value: String, message: &str) -> AppResult<Identifier> {
    Identifier::parse(value).ok_or_else(|| AppError::Validation(message.to_string()))
}

#[async_trait]
impl ConsoleServiceTrait for ConsoleService {
    async fn connect(
        &self,
        session_id: &str,
        req: TestConnectionRequest,
    ) -> AppResult<ConnectionInfo> {
        let db_type: DbType = req.db_type.parse()?;
        let (params, password) = req.into_parts();
        self.registry
            .open(session_id, db_type, &params, password.as_deref())
            .await
    }

    async fn disconnect(&self, session_id: &str) {
        self.registry.close(session_id).await;
    }

    async fn list_databases(&self, session_id: &str) -> AppResult<Vec<String>> {
        let entry = self.active(session_id).await?;
        entry.backend().list_databases().await
    }

    async fn create_database(
        &self,
        session_id: &str,
        req: CreateDatabaseRequest,
    ) -> AppResult<String> {
        let entry = self.active(session_id).await?;
        validate_request(&req)?;
        let name = identifier(req.name, INVALID_DATABASE_NAME)?;

        entry.backend().create_database(&name).await?;
        tracing::info!(session_id = %session_id, db_type = %entry.db_type, database = %name, "database created");
        Ok(name.to_string())
    }

    async fn drop_database(&self, session_id: &str, name: String) -> AppResult<String> {
        let entry = self.active(session_id).await?;
        let name = identifier(name, INVALID_DATABASE_NAME)?;

        entry.backend().drop_database(&name).await?;
        tracing::info!(session_id = %session_id, db_type = %entry.db_type, database = %name, "database dropped");
        Ok(name.to_string())
    }

    async fn list_users(&self, session_id: &str) -> AppResult<Vec<UserItem>> {
        let entry = self.active(session_id).await?;
        entry.backend().list_users().await
    }

    async fn create_user(&self, session_id: &str, req: CreateUserRequest) -> AppResult<String> {
        let entry = self.active(session_id).await?;
        validate_request(&req)?;
        let username = identifier(req.username, INVALID_USERNAME)?;

        entry
            .backend()
            .create_user(&username, &req.password, req.host.as_deref())
            .await?;
        tracing::info!(session_id = %session_id, db_type = %entry.db_type, user = %username, "user created");
        Ok(username.to_string())
    }

    async fn drop_user(
        &self,
        session_id: &str,
        username: String,
        host: Option<String>,
    ) -> AppResult<String> {
        let entry = self.active(session_id).await?;
        let username = identifier(username, INVALID_USERNAME)?;

        entry.backend().drop_user(&username, host.as_deref()).await?;
        tracing::info!(session_id = %session_id, db_type = %entry.db_type, user = %username, "user dropped");
        Ok(username.to_string())
    }

    async fn execute_query(&self, session_id: &str, req: QueryRequest) -> AppResult<QueryResult> {
        let entry = self.active(session_id).await?;
        validate_request(&req)?;

        let result = entry.backend().execute(&req.query).await?;
        tracing::debug!(session_id = %session_id, db_type = %entry.db_type, row_count = result.row_count, "query executed");
        Ok(result)
    }
}
