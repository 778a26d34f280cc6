//! Application configuration.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory.

use std::path::{Path, PathBuf};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_COOKIE: &str = "sql_console_sid";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Runtime configuration shared by the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and health responses.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Timeout for establishing a database connection.
    pub connect_timeout_secs: u64,
    /// Name of the session cookie.
    pub session_cookie_name: String,
    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,
    /// Directory with the browser front-end, served at `/`.
    pub static_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "sql-console".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            session_cookie_secure: false,
            static_dir: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment for the named service.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            service_name: service_name.to_string(),
            host: non_empty("SERVER_HOST").unwrap_or(defaults.host),
            port: non_empty("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            connect_timeout_secs: non_empty("DB_CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.connect_timeout_secs),
            session_cookie_name: non_empty("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            session_cookie_secure: non_empty("SESSION_COOKIE_SECURE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.session_cookie_secure),
            static_dir: non_empty("STATIC_DIR").map(PathBuf::from),
            log_format: non_empty("LOG_FORMAT")
                .map(|v| LogFormat::parse(v.trim()))
                .unwrap_or(defaults.log_format),
        }
    }

    /// Returns the `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads `KEY=VALUE` pairs from a `.env` file into the process environment.
///
/// Best-effort: a missing or unreadable file is ignored, and variables already
/// present in the environment are never overwritten.
pub fn load_dotenv(path: impl AsRef<Path>) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup("test", |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.session_cookie_name, "sql_console_sid");
        assert!(config.static_dir.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config_from(&[
            ("SERVER_PORT", "8088"),
            ("DB_CONNECT_TIMEOUT_SECS", "not-a-number"),
            ("SESSION_COOKIE_SECURE", "true"),
            ("STATIC_DIR", "./public"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.port, 8088);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.session_cookie_secure);
        assert_eq!(config.static_dir, Some(PathBuf::from("./public")));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr(), "0.0.0.0:8088");
    }

    #[test]
    fn test_parse_dotenv_skips_comments() {
        let pairs = parse_dotenv("# comment\n\nSERVER_PORT=4000\nNAME=\"quoted\"\nbroken line\n");
        assert_eq!(
            pairs,
            vec![
                ("SERVER_PORT".to_string(), "4000".to_string()),
                ("NAME".to_string(), "quoted".to_string()),
            ]
        );
    }
}
