//! SQLite backend.
//!
//! SQLite has no server-side catalogs or principals, so the administrative
//! capabilities report an unsupported operation and only ad-hoc queries run.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Either, Executor};

use common::errors::{AppError, AppResult};
use common::models::{ConnectionInfo, ConnectionParams, DbType, QueryResult, UserItem};
use common::utils::Identifier;

use super::value::sqlite_row_to_json;
use super::{
    connect_direct, connection_error, described_fields, query_error, DatabaseBackend,
    OpenedConnection, SessionConnection,
};

/// Path reported for in-memory databases.
pub const MEMORY_PATH: &str = ":memory:";

/// Handle for a SQLite file or in-memory database.
pub struct SqliteBackend {
    conn: SessionConnection<SqliteConnection>,
    path: String,
}

impl SqliteBackend {
    /// Opens (or creates) the database file named by `params.database`.
    ///
    /// An empty path or `:memory:` opens a private in-memory database.
    pub async fn connect(
        params: &ConnectionParams,
        timeout: Duration,
    ) -> AppResult<OpenedConnection> {
        let path = params
            .database
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(MEMORY_PATH)
            .to_string();

        let options = if path == MEMORY_PATH {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(connection_error)?
        } else {
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true)
        };

        // in-memory data lives exactly as long as this connection
        let conn = connect_direct(&options, timeout).await?;

        tracing::info!(path = %path, "SQLite database opened");

        let mut params = params.clone();
        params.database = Some(path.clone());

        Ok(OpenedConnection {
            backend: Box::new(Self {
                conn: SessionConnection::new(conn),
                path: path.clone(),
            }),
            info: ConnectionInfo {
                db_type: DbType::SQLite,
                version: None,
                database: Some(path),
            },
            params,
        })
    }

    fn unsupported(message: &str) -> AppError {
        AppError::UnsupportedOperation(message.to_string())
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    fn db_type(&self) -> DbType {
        DbType::SQLite
    }

    async fn list_databases(&self) -> AppResult<Vec<String>> {
        Ok(vec![self.path.clone()])
    }

    async fn create_database(&self, _name: &Identifier) -> AppResult<()> {
        Err(Self::unsupported(
            "SQLite does not support CREATE DATABASE. Use a file path instead.",
        ))
    }

    async fn drop_database(&self, _name: &Identifier) -> AppResult<()> {
        Err(Self::unsupported("SQLite does not support DROP DATABASE"))
    }

    async fn list_users(&self) -> AppResult<Vec<UserItem>> {
        Err(Self::unsupported(
            "SQLite does not have a user management system",
        ))
    }

    async fn create_user(
        &self,
        _username: &Identifier,
        _password: &str,
        _host: Option<&str>,
    ) -> AppResult<()> {
        Err(Self::unsupported("SQLite does not support user management"))
    }

    async fn drop_user(&self, _username: &Identifier, _host: Option<&str>) -> AppResult<()> {
        Err(Self::unsupported("SQLite does not support user management"))
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
                    Either::Right(row) => rows.push(sqlite_row_to_json(&row)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn open(database: Option<&str>) -> OpenedConnection {
        let params = ConnectionParams {
            database: database.map(str::to_string),
            ..Default::default()
        };
        SqliteBackend::connect(&params, Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_path_opens_memory() {
        let opened = open(Some("")).await;
        assert_eq!(opened.info.database.as_deref(), Some(MEMORY_PATH));
        assert_eq!(opened.params.database.as_deref(), Some(MEMORY_PATH));
        assert_eq!(
            opened.backend.list_databases().await.unwrap(),
            vec![MEMORY_PATH.to_string()]
        );
    }

    #[tokio::test]
    async fn test_memory_data_survives_between_statements() {
        let opened = open(None).await;
        let backend = opened.backend;

        let created = backend
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();
        assert_eq!(created.row_count, 0);
        assert!(created.fields.is_empty());

        let inserted = backend
            .execute("INSERT INTO t (name) VALUES ('a'), ('b')")
            .await
            .unwrap();
        assert_eq!(inserted.row_count, 2);

        let selected = backend
            .execute("SELECT id, name FROM t ORDER BY id")
            .await
            .unwrap();
        assert_eq!(selected.row_count, 2);
        assert_eq!(selected.fields, vec!["id", "name"]);
        assert_eq!(selected.rows[1]["name"], json!("b"));
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.db");
        let path_str = path.to_string_lossy().to_string();

        let opened = open(Some(&path_str)).await;
        assert_eq!(opened.info.database.as_deref(), Some(path_str.as_str()));
        opened.backend.execute("CREATE TABLE x (v)").await.unwrap();
        opened.backend.close().await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_empty_select_still_reports_columns() {
        let backend = open(None).await.backend;
        backend
            .execute("CREATE TABLE people (id INTEGER, name TEXT)")
            .await
            .unwrap();

        let result = backend
            .execute("SELECT id, name AS label FROM people WHERE id < 0")
            .await
            .unwrap();
        assert_eq!(result.row_count, 0);
        assert!(result.rows.is_empty());
        assert_eq!(result.fields, vec!["id", "label"]);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("console.db");
        let params = ConnectionParams {
            database: Some(path.to_string_lossy().to_string()),
            ..Default::default()
        };

        let err = match SqliteBackend::connect(&params, Duration::from_secs(5)).await {
            Ok(_) => panic!("opening a file in a missing directory succeeded"),
            Err(e) => e,
        };
        assert!(matches!(err, AppError::DatabaseConnection(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_closed_handle_rejects_statements() {
        let backend = open(None).await.backend;
        backend.close().await.unwrap();
        backend.close().await.unwrap();

        let err = backend.execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.to_string(), "Connection is closed");
    }

    #[tokio::test]
    async fn test_admin_operations_are_unsupported() {
        let backend = open(None).await.backend;
        let name = Identifier::parse("reports").unwrap();

        let err = backend.create_database(&name).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "SQLite does not support CREATE DATABASE. Use a file path instead."
        );
        let err = backend.list_users().await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedOperation(_)));
        let err = backend.drop_user(&name, None).await.unwrap_err();
        assert_eq!(err.to_string(), "SQLite does not support user management");
    }

    #[tokio::test]
    async fn test_syntax_error_keeps_driver_text() {
        let backend = open(None).await.backend;
        let err = backend.execute("SELEC 1").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseQuery(_)));
        assert!(err.to_string().contains("syntax error"));
    }
}
