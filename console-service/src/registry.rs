//! Connection registry.
//!
//! Maps a browser session to the single live database handle it opened with
//! `POST /api/test-connection`. A session holds at most one handle; opening a
//! new one replaces the previous entry and closes its handle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::errors::AppResult;
use common::models::{ConnectionInfo, ConnectionParams, DbType};

use crate::backends::{Connector, DatabaseBackend, OpenedConnection};

/// A session's active connection.
pub struct ConnectionEntry {
    /// Owning session.
    pub session_id: String,
    /// Engine of the handle.
    pub db_type: DbType,
    /// Parameters used to open the handle, without the password.
    pub params: ConnectionParams,
    /// Server version read while connecting (network engines).
    pub server_version: Option<String>,
    /// When the handle was opened.
    pub connected_at: DateTime<Utc>,
    backend: Box<dyn DatabaseBackend>,
}

impl ConnectionEntry {
    /// Returns the live handle.
    pub fn backend(&self) -> &dyn DatabaseBackend {
        self.backend.as_ref()
    }
}

impl std::fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("session_id", &self.session_id)
            .field("db_type", &self.db_type)
            .field("params", &self.params)
            .field("server_version", &self.server_version)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

/// Session ID to connection mapping.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    entries: RwLock<HashMap<String, Arc<ConnectionEntry>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry that opens handles through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Opens a handle for the session, replacing any previous one.
    ///
    /// On failure the registry is left untouched, so an earlier connection
    /// of the same session stays usable.
    pub async fn open(
        &self,
        session_id: &str,
        db_type: DbType,
        params: &ConnectionParams,
        password: Option<&str>,
    ) -> AppResult<ConnectionInfo> {
        let OpenedConnection {
            backend,
            info,
            params,
        } = match self.connector.connect(db_type, params, password).await {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!(session_id = %session_id, db_type = %db_type, error = %e, "connection attempt failed");
                return Err(e);
            }
        };

        let entry = Arc::new(ConnectionEntry {
            session_id: session_id.to_string(),
            db_type,
            params,
            server_version: info.version.clone(),
            connected_at: Utc::now(),
            backend,
        });

        let previous = self
            .entries
            .write()
            .await
            .insert(session_id.to_string(), entry);

        if let Some(previous) = previous {
            tracing::info!(session_id = %session_id, db_type = %previous.db_type, "replacing previous connection");
            Self::shutdown(&previous).await;
        }

        tracing::info!(session_id = %session_id, db_type = %db_type, "session connected");
        Ok(info)
    }

    /// Closes and forgets the session's handle. A no-op if there is none.
    pub async fn close(&self, session_id: &str) {
        let removed = self.entries.write().await.remove(session_id);
        if let Some(entry) = removed {
            Self::shutdown(&entry).await;
            let connected_secs = (Utc::now() - entry.connected_at).num_seconds();
            tracing::info!(session_id = %session_id, connected_secs, "session disconnected");
        }
    }

    /// Looks up the session's active connection.
    pub async fn get(&self, session_id: &str) -> Option<Arc<ConnectionEntry>> {
        self.entries.read().await.get(session_id).cloned()
    }

    /// Closes every registered handle.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.entries.write().await.drain().map(|(_, e)| e).collect();
        if drained.is_empty() {
            return;
        }
        tracing::info!(count = drained.len(), "closing all connections");
        for entry in drained {
            Self::shutdown(&entry).await;
        }
    }

    /// Number of sessions with an active connection.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` when no session is connected.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn shutdown(entry: &ConnectionEntry) {
        if let Err(e) = entry.backend.close().await {
            tracing::warn!(session_id = %entry.session_id, error = %e, "error while closing connection");
        }
    }
}
