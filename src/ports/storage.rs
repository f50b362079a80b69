//! Storage port: Trait for persisting predictions.
//!
//! This trait abstracts the database backend (PostgreSQL, SQLite) from the
//! prediction service. Every method reports failure as a typed error; the
//! caller decides what degraded value to use instead.

use async_trait::async_trait;

use crate::adapters::StorageError;
use crate::domain::{Classification, InsertReceipt, PatientObservation, PredictionRecord};

/// Upper bound on rows scanned for statistics.
pub const STATS_SCAN_LIMIT: usize = 1000;

/// Trait for the `predictions` table.
///
/// Implementations open a dedicated connection per call and hold no shared
/// mutable state between calls.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Create the table and index if they do not exist. Idempotent.
    ///
    /// # Errors
    /// Returns error if the database is unreachable or the DDL fails.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Insert one prediction row.
    ///
    /// # Returns
    /// The store-assigned identity and creation timestamp.
    ///
    /// # Errors
    /// Returns error on any connectivity or constraint failure.
    async fn insert(
        &self,
        observation: &PatientObservation,
        classification: &Classification,
    ) -> Result<InsertReceipt, StorageError>;

    /// Load up to `limit` rows, most recent first. `limit` is raised to 1 if zero.
    ///
    /// # Errors
    /// Returns error if the query fails.
    async fn query_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StorageError>;

    /// Count all stored rows.
    ///
    /// # Errors
    /// Returns error if the query fails.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Clamp a caller-supplied limit to at least one row.
#[must_use]
pub fn bounded_limit(limit: usize) -> usize {
    limit.max(1)
}
