//! MySQL / MariaDB backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Either, Executor};

use common::errors::AppResult;
use common::models::user::user_host_or_default;
use common::models::{ConnectionInfo, ConnectionParams, DbType, QueryResult, UserItem};
use common::utils::Identifier;

use super::value::{mysql_row_to_json, mysql_text};
use super::{
    connect_direct, connection_error, described_fields, query_error, DatabaseBackend,
    OpenedConnection, SessionConnection,
};

const DEFAULT_HOST: &str = "localhost";

/// Handle for MySQL-protocol servers.
pub struct MySqlBackend {
    db_type: DbType,
    conn: SessionConnection<MySqlConnection>,
}

impl MySqlBackend {
    /// Connects and reads the server version.
    ///
    /// An empty database name connects without selecting a schema.
    pub async fn connect(
        db_type: DbType,
        params: &ConnectionParams,
        password: Option<&str>,
        timeout: Duration,
    ) -> AppResult<OpenedConnection> {
        let mut options = MySqlConnectOptions::new()
            .host(params.host.as_deref().unwrap_or(DEFAULT_HOST))
            .port(params.port.or(db_type.default_port()).unwrap_or(3306));
        if let Some(username) = params.username.as_deref() {
            options = options.username(username);
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            options = options.password(password);
        }
        if let Some(database) = params.database.as_deref() {
            options = options.database(database);
        }

        let mut conn = connect_direct(&options, timeout).await?;

        let version = match (&mut conn).fetch_one(sqlx::raw_sql("SELECT VERSION() AS version"))
            .await
        {
            Ok(row) => mysql_text(&row, 0),
            Err(e) => {
                let _ = conn.close_hard().await;
                return Err(connection_error(e));
            }
        };

        tracing::info!(db_type = %db_type, version = %version, "MySQL connection opened");

        Ok(OpenedConnection {
            backend: Box::new(Self {
                db_type,
                conn: SessionConnection::new(conn),
            }),
            info: ConnectionInfo {
                db_type,
                version: Some(version),
                database: None,
            },
            params: params.clone(),
        })
    }

    async fn run(&self, statement: &str) -> AppResult<()> {
        let mut conn = self.conn.lock().await?;
        (&mut *conn).execute(sqlx::raw_sql(statement))
            .await
            .map_err(query_error)?;
        Ok(())
    }
}

#[async_trait]
impl DatabaseBackend for MySqlBackend {
    fn db_type(&self) -> DbType {
        self.db_type
    }

    async fn list_databases(&self) -> AppResult<Vec<String>> {
        let mut conn = self.conn.lock().await?;
        let rows = (&mut *conn).fetch_all(sqlx::raw_sql("SHOW DATABASES"))
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(|row| mysql_text(row, 0)).collect())
    }

    async fn create_database(&self, name: &Identifier) -> AppResult<()> {
        self.run(&format!("CREATE DATABASE `{name}`")).await
    }

    async fn drop_database(&self, name: &Identifier) -> AppResult<()> {
        self.run(&format!("DROP DATABASE `{name}`")).await
    }

    async fn list_users(&self) -> AppResult<Vec<UserItem>> {
        let mut conn = self.conn.lock().await?;
        let rows = (&mut *conn).fetch_all(sqlx::raw_sql("SELECT User, Host FROM mysql.user"))
            .await
            .map_err(query_error)?;
        Ok(rows
            .iter()
            .map(|row| UserItem {
                user: mysql_text(row, 0),
                host: mysql_text(row, 1),
            })
            .collect())
    }

    async fn create_user(
        &self,
        username: &Identifier,
        password: &str,
        host: Option<&str>,
    ) -> AppResult<()> {
        let host = user_host_or_default(host);
        // password and host are spliced in unescaped
        self.run(&format!(
            "CREATE USER '{username}'@'{host}' IDENTIFIED BY '{password}'"
        ))
        .await
    }

    async fn drop_user(&self, username: &Identifier, host: Option<&str>) -> AppResult<()> {
        let host = user_host_or_default(host);
        self.run(&format!("DROP USER '{username}'@'{host}'")).await
    }

    async fn execute(&self, sql: &str) -> AppResult<QueryResult> {
        let mut conn = self.conn.lock().await?;
        let mut rows = Vec::new();
        let mut rows_affected = 0u64;

        {
            let mut stream = (&mut *conn).fetch_many(sqlx::raw_sql(sql));
            while let Some(step) = stream.try_next().await.map_err(query_error)? {
                match step {
                    Either::Left(done) => rows_affected += done.rows_affected(),
                    Either::Right(row) => rows.push(mysql_row_to_json(&row)),
                }
            }
        }

        let mut result = QueryResult::from_rows(rows, rows_affected);
        if result.rows.is_empty() && rows_affected == 0 {
            result.fields = described_fields((&mut *conn).describe(sql).await);
        }
        Ok(result)
    }

    async fn close(&self) -> AppResult<()> {
        self.conn.close().await
    }
}
