//! Adapters layer: concrete implementations of ports.
//!
//! - `model`: JSON model artifacts and the classifiers they describe
//! - `postgres`: PostgreSQL prediction store (production)
//! - `sqlite`: SQLite prediction store (local runs, tests)
//! - `sanitize`: PII and secret filtering for logs

pub mod model;
pub mod postgres;
pub mod sanitize;
pub mod sqlite;

pub use model::{ArtifactError, ArtifactKind, ClassifierModel, LoadedModel, ModelArtifact};
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Errors raised by prediction stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}
