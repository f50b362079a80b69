//! Service configuration.
//!
//! Every setting can be given as a command-line flag or through the
//! environment. Defaults target a local PostgreSQL install and the model
//! artifact shipped under `models/`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use zeroize::Zeroize;

/// Top-level configuration for the `heartscore` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "heartscore", version, about = "Heart disease prediction API")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "HEARTSCORE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Model artifact file, or a directory containing one
    #[arg(
        long,
        env = "HEARTSCORE_MODEL_PATH",
        default_value = "models/heart_disease_model.json"
    )]
    pub model_path: PathBuf,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Which database adapter backs the predictions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Postgres,
    Sqlite,
}

/// Database connection settings.
///
/// The password is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, Args)]
pub struct DatabaseConfig {
    /// Storage backend
    #[arg(
        long = "db-backend",
        env = "HEARTSCORE_DB_BACKEND",
        value_enum,
        default_value = "postgres"
    )]
    pub backend: StorageBackend,

    /// PostgreSQL host
    #[arg(long = "db-host", env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// PostgreSQL port
    #[arg(long = "db-port", env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,

    /// PostgreSQL user
    #[arg(long = "db-user", env = "DB_USER", default_value = "postgres")]
    pub user: String,

    /// PostgreSQL password
    #[arg(
        long = "db-password",
        env = "DB_PASSWORD",
        default_value = "postgres",
        hide_env_values = true,
        hide_default_value = true
    )]
    password: String,

    /// PostgreSQL database name
    #[arg(long = "db-name", env = "DB_NAME", default_value = "heart_disease_db")]
    pub name: String,

    /// SQLite database file (sqlite backend only)
    #[arg(
        long = "sqlite-path",
        env = "HEARTSCORE_SQLITE_PATH",
        default_value = "data/predictions.db"
    )]
    pub sqlite_path: PathBuf,
}

impl DatabaseConfig {
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("sqlite_path", &self.sqlite_path)
            .finish()
    }
}

impl Drop for DatabaseConfig {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Where formatted log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogMode {
    Stdout,
    File,
}

/// How log lines are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging settings. Verbosity itself comes from `RUST_LOG`.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log destination
    #[arg(
        long = "log-mode",
        env = "HEARTSCORE_LOG_MODE",
        value_enum,
        default_value = "stdout"
    )]
    pub mode: LogMode,

    /// Log file (file mode only)
    #[arg(
        long = "log-file",
        env = "HEARTSCORE_LOG_FILE",
        default_value = "logs/heartscore.log"
    )]
    pub file: PathBuf,

    /// Log line format
    #[arg(
        long = "log-format",
        env = "HEARTSCORE_LOG_FORMAT",
        value_enum,
        default_value = "text"
    )]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "heartscore",
            "--bind",
            "127.0.0.1:9000",
            "--db-backend",
            "sqlite",
            "--db-host",
            "db.internal",
            "--db-port",
            "6543",
            "--db-password",
            "hunter2",
            "--log-format",
            "json",
        ])
        .expect("Should parse");

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database.backend, StorageBackend::Sqlite);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.password(), "hunter2");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ServerConfig::try_parse_from(["heartscore", "--db-password", "s3cr3t-pw"])
            .expect("Should parse");
        let printed = format!("{:?}", config.database);
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("s3cr3t-pw"));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(ServerConfig::try_parse_from(["heartscore", "--db-port", "not-a-port"]).is_err());
    }
}
