//! Database backends.
//!
//! One [`DatabaseBackend`] implementation per engine family, chosen once when
//! a session connects. The router only ever talks to the trait, so a new
//! engine is a new module plus one arm in [`SqlxConnector`].

pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod value;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Column, ConnectOptions, Connection, Database, Describe};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use common::errors::{AppError, AppResult};
use common::models::{ConnectionInfo, ConnectionParams, DbType, QueryResult, UserItem};
use common::utils::Identifier;

pub use self::mysql::MySqlBackend;
pub use self::postgres::PostgresBackend;
pub use self::sqlite::SqliteBackend;

/// Capability set of a live database handle.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Engine this handle talks to.
    fn db_type(&self) -> DbType;

    /// Lists databases (catalogs) visible to the connected principal.
    async fn list_databases(&self) -> AppResult<Vec<String>>;

    /// Creates a database.
    async fn create_database(&self, name: &Identifier) -> AppResult<()>;

    /// Drops a database.
    async fn drop_database(&self, name: &Identifier) -> AppResult<()>;

    /// Lists principals.
    async fn list_users(&self) -> AppResult<Vec<UserItem>>;

    /// Creates a principal. `host` is only meaningful for host-scoped engines.
    async fn create_user(
        &self,
        username: &Identifier,
        password: &str,
        host: Option<&str>,
    ) -> AppResult<()>;

    /// Drops a principal. `host` is only meaningful for host-scoped engines.
    async fn drop_user(&self, username: &Identifier, host: Option<&str>) -> AppResult<()>;

    /// Runs caller-supplied SQL verbatim.
    async fn execute(&self, sql: &str) -> AppResult<QueryResult>;

    /// Releases the underlying connection.
    async fn close(&self) -> AppResult<()>;
}

/// A freshly opened handle together with what was learned while connecting.
pub struct OpenedConnection {
    /// The live handle.
    pub backend: Box<dyn DatabaseBackend>,
    /// Details reported to the client.
    pub info: ConnectionInfo,
    /// Parameters to retain; for SQLite the database is the path actually opened.
    pub params: ConnectionParams,
}

/// Opens database handles. Injected into the registry.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a handle for `db_type`. The password is only used for the handshake.
    async fn connect(
        &self,
        db_type: DbType,
        params: &ConnectionParams,
        password: Option<&str>,
    ) -> AppResult<OpenedConnection>;
}

/// Production connector backed by sqlx.
#[derive(Debug, Clone)]
pub struct SqlxConnector {
    connect_timeout: Duration,
}

impl SqlxConnector {
    /// Creates a connector with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    async fn connect(
        &self,
        db_type: DbType,
        params: &ConnectionParams,
        password: Option<&str>,
    ) -> AppResult<OpenedConnection> {
        match db_type {
            DbType::MySQL | DbType::MariaDB => {
                MySqlBackend::connect(db_type, params, password, self.connect_timeout).await
            }
            DbType::PostgreSQL => {
                PostgresBackend::connect(params, password, self.connect_timeout).await
            }
            DbType::SQLite => SqliteBackend::connect(params, self.connect_timeout).await,
        }
    }
}

/// The one physical connection owned by a session.
///
/// Concurrent statements from the same session queue on the mutex. Once
/// closed, every further use reports a closed connection.
pub(crate) struct SessionConnection<C> {
    inner: Mutex<Option<C>>,
}

impl<C: Connection> SessionConnection<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            inner: Mutex::new(Some(conn)),
        }
    }

    /// Waits for exclusive use of the connection.
    pub(crate) async fn lock(&self) -> AppResult<MappedMutexGuard<'_, C>> {
        MutexGuard::try_map(self.inner.lock().await, Option::as_mut)
            .map_err(|_| AppError::DatabaseQuery("Connection is closed".into()))
    }

    /// Sends the engine's shutdown message. Idempotent.
    pub(crate) async fn close(&self) -> AppResult<()> {
        let conn = self.inner.lock().await.take();
        match conn {
            Some(conn) => conn.close().await.map_err(query_error),
            None => Ok(()),
        }
    }
}

/// Opens a single connection straight through the driver, so refusals and
/// authentication failures surface with the driver's own message.
pub(crate) async fn connect_direct<O>(options: &O, timeout: Duration) -> AppResult<O::Connection>
where
    O: ConnectOptions,
    O::Connection: Sized,
{
    match tokio::time::timeout(timeout, options.connect()).await {
        Ok(result) => result.map_err(connection_error),
        Err(_) => Err(AppError::DatabaseConnection(format!(
            "timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// Column names from a statement description; empty when it cannot be described.
pub(crate) fn described_fields<DB: Database>(
    described: Result<Describe<DB>, sqlx::Error>,
) -> Vec<String> {
    match described {
        Ok(describe) => describe
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Extracts the driver's own message from a sqlx error.
pub(crate) fn driver_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn query_error(err: sqlx::Error) -> AppError {
    AppError::DatabaseQuery(driver_message(&err))
}

pub(crate) fn connection_error(err: sqlx::Error) -> AppError {
    AppError::DatabaseConnection(driver_message(&err))
}
