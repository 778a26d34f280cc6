//! PostgreSQL backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Either, Executor, Row};

use common::errors::AppResult;
use common::models::user::HOST_NOT_APPLICABLE;
use common::models::{ConnectionInfo, ConnectionParams, DbType, QueryResult, UserItem};
use common::utils::Identifier;

use super::value::postgres_row_to_json;
use super::{
    connect_direct, connection_error, described_fields, query_error, DatabaseBackend,
    OpenedConnection, SessionConnection,
};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_DATABASE: &str = "postgres";

/// Handle for PostgreSQL servers.
pub struct PostgresBackend {
    conn: SessionConnection<PgConnection>,
}

impl PostgresBackend {
    /// Connects and reads the server version.
    ///
    /// An empty database name connects to `postgres`.
    pub async fn connect(
        params: &ConnectionParams,
        password: Option<&str>,
        timeout: Duration,
    ) -> AppResult<OpenedConnection> {
        let mut options = PgConnectOptions::new()
            .host(params.host.as_deref().unwrap_or(DEFAULT_HOST))
            .port(params.port.or(DbType::PostgreSQL.default_port()).unwrap_or(5432))
            .database(params.database.as_deref().unwrap_or(DEFAULT_DATABASE));
        if let Some(username) = params.username.as_deref() {
            options = options.username(username);
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            options = options.password(password);
        }

        let mut conn = connect_direct(&options, timeout).await?;

        let version = match (&mut conn).fetch_one(sqlx::raw_sql("SELECT version()")).await {
            Ok(row) => row.try_get::<String, _>(0).map_err(connection_error),
            Err(e) => Err(connection_error(e)),
        };
        let version = match version {
            Ok(version) => version,
            Err(e) => {
                let _ = conn.close_hard().await;
                return Err(e);
            }
        };

        tracing::info!(version = %version, "PostgreSQL connection opened");

        Ok(OpenedConnection {
            backend: Box::new(Self {
                conn: SessionConnection::new(conn),
            }),
            info: ConnectionInfo {
                db_type: DbType::PostgreSQL,
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
impl DatabaseBackend for PostgresBackend {
    fn db_type(&self) -> DbType {
        DbType::PostgreSQL
    }

    async fn list_databases(&self) -> AppResult<Vec<String>> {
        let mut conn = self.conn.lock().await?;
        sqlx::query_scalar::<_, String>(
            "SELECT datname FROM pg_database WHERE datistemplate = false",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(query_error)
    }

    async fn create_database(&self, name: &Identifier) -> AppResult<()> {
        self.run(&format!("CREATE DATABASE \"{name}\"")).await
    }

    async fn drop_database(&self, name: &Identifier) -> AppResult<()> {
        self.run(&format!("DROP DATABASE \"{name}\"")).await
    }

    async fn list_users(&self) -> AppResult<Vec<UserItem>> {
        let mut conn = self.conn.lock().await?;
        let names = sqlx::query_scalar::<_, String>("SELECT usename FROM pg_user")
            .fetch_all(&mut *conn)
            .await
            .map_err(query_error)?;
        Ok(names
            .into_iter()
            .map(|user| UserItem {
                user,
                host: HOST_NOT_APPLICABLE.to_string(),
            })
            .collect())
    }

    async fn create_user(
        &self,
        username: &Identifier,
        password: &str,
        _host: Option<&str>,
    ) -> AppResult<()> {
        // password is spliced in unescaped
        self.run(&format!(
            "CREATE USER \"{username}\" WITH PASSWORD '{password}'"
        ))
        .await
    }

    async fn drop_user(&self, username: &Identifier, _host: Option<&str>) -> AppResult<()> {
        self.run(&format!("DROP USER \"{username}\"")).await
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
                    Either::Right(row) => rows.push(postgres_row_to_json(&row)),
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
