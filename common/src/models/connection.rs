//! Connection models.
//!
//! Contains the database type enumeration and the connect request/response.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Database type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL database.
    MySQL,
    /// MariaDB database (MySQL wire protocol).
    MariaDB,
    /// PostgreSQL database.
    PostgreSQL,
    /// SQLite database file or in-memory instance.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL | DbType::MariaDB => Some(3306),
            DbType::PostgreSQL => Some(5432),
            DbType::SQLite => None,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::MariaDB => write!(f, "mariadb"),
            DbType::PostgreSQL => write!(f, "postgresql"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for DbType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(DbType::MySQL),
            "mariadb" => Ok(DbType::MariaDB),
            "postgresql" | "postgres" => Ok(DbType::PostgreSQL),
            "sqlite" => Ok(DbType::SQLite),
            _ => Err(AppError::UnsupportedDatabaseType(
                "Unsupported database type".into(),
            )),
        }
    }
}

/// Request body for `POST /api/test-connection`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TestConnectionRequest {
    /// Database type (`mysql`, `mariadb`, `postgresql`, `sqlite`).
    #[serde(rename = "type", default)]
    pub db_type: String,
    /// Database host (network engines, default `localhost`).
    #[serde(default)]
    pub host: Option<String>,
    /// Database port; accepts a number, a numeric string, or null.
    #[serde(default, deserialize_with = "lenient_port")]
    #[schema(value_type = Option<u16>)]
    pub port: Option<u16>,
    /// Database username.
    #[serde(default)]
    pub username: Option<String>,
    /// Database password; used to open the handle and then dropped.
    #[serde(default)]
    pub password: Option<String>,
    /// Database name, or the file path for SQLite.
    #[serde(default)]
    pub database: Option<String>,
}

impl TestConnectionRequest {
    /// Splits the request into the retained parameters and the password.
    pub fn into_parts(self) -> (ConnectionParams, Option<String>) {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        (
            ConnectionParams {
                host: non_empty(self.host),
                port: self.port.filter(|p| *p != 0),
                username: non_empty(self.username),
                database: non_empty(self.database),
            },
            self.password,
        )
    }
}

fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<RawPort>::deserialize(deserializer)? {
        Some(RawPort::Number(n)) if n.is_finite() && n >= 0.0 && n <= u16::MAX as f64 => {
            Some(n as u16)
        }
        Some(RawPort::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Connection parameters retained for the lifetime of a session's connection.
///
/// Never holds the password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConnectionParams {
    /// Database host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Database name or SQLite path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Details reported after a successful connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConnectionInfo {
    /// Database type.
    #[serde(rename = "type")]
    pub db_type: DbType,
    /// Server version string (network engines).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Opened path (SQLite).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Payload of a successful connection test.
#[derive(Debug, Serialize, ToSchema)]
pub struct TestConnectionData {
    /// Connection details.
    pub info: ConnectionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_db_type() {
        assert_eq!("MySQL".parse::<DbType>().unwrap(), DbType::MySQL);
        assert_eq!("postgres".parse::<DbType>().unwrap(), DbType::PostgreSQL);
        assert_eq!("sqlite".parse::<DbType>().unwrap(), DbType::SQLite);
        let err = "oracle".parse::<DbType>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported database type");
    }

    #[test]
    fn test_port_accepts_number_string_and_null() {
        let req: TestConnectionRequest =
            serde_json::from_str(r#"{"type":"mysql","port":3307}"#).unwrap();
        assert_eq!(req.port, Some(3307));
        let req: TestConnectionRequest =
            serde_json::from_str(r#"{"type":"mysql","port":"5433"}"#).unwrap();
        assert_eq!(req.port, Some(5433));
        let req: TestConnectionRequest =
            serde_json::from_str(r#"{"type":"mysql","port":null}"#).unwrap();
        assert_eq!(req.port, None);
        let req: TestConnectionRequest = serde_json::from_str(r#"{"type":"sqlite"}"#).unwrap();
        assert_eq!(req.port, None);
    }

    #[test]
    fn test_into_parts_drops_password_and_blanks() {
        let req = TestConnectionRequest {
            db_type: "mysql".into(),
            host: Some("db.local".into()),
            port: Some(0),
            username: Some("root".into()),
            password: Some("secret".into()),
            database: Some("".into()),
        };
        let (params, password) = req.into_parts();
        assert_eq!(password.as_deref(), Some("secret"));
        assert_eq!(params.host.as_deref(), Some("db.local"));
        assert_eq!(params.port, None);
        assert_eq!(params.database, None);
    }

    #[test]
    fn test_info_serialization() {
        let info = ConnectionInfo {
            db_type: DbType::SQLite,
            version: None,
            database: Some(":memory:".into()),
        };
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            serde_json::json!({"type": "sqlite", "database": ":memory:"})
        );
    }
}
