//! SQLite adapter: file-backed implementation of `PredictionStore`.
//!
//! Used for local runs and tests. Each call opens its own connection on
//! tokio's blocking pool, runs one statement and drops the connection.
//! Timestamps are produced by SQLite itself as millisecond-precision
//! RFC 3339 UTC strings, so lexical order equals chronological order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, Row};

use crate::adapters::StorageError;
use crate::domain::{
    ClinicalFeatures, Classification, InsertReceipt, PatientObservation, PredictionRecord,
    RiskLevel,
};
use crate::ports::{bounded_limit, PredictionStore};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_name TEXT NOT NULL,
        age INTEGER NOT NULL,
        sex INTEGER NOT NULL,
        cp INTEGER NOT NULL,
        trestbps INTEGER NOT NULL,
        chol INTEGER NOT NULL,
        fbs INTEGER NOT NULL,
        restecg INTEGER NOT NULL,
        thalach INTEGER NOT NULL,
        exang INTEGER NOT NULL,
        oldpeak REAL NOT NULL,
        slope INTEGER NOT NULL,
        ca INTEGER NOT NULL,
        thal INTEGER NOT NULL,
        prediction INTEGER NOT NULL,
        disease_probability REAL NOT NULL,
        risk_level TEXT NOT NULL,
        prediction_date TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE INDEX IF NOT EXISTS idx_predictions_date
        ON predictions(prediction_date DESC);
";

const SELECT_COLUMNS: &str = "id, patient_name, age, sex, cp, trestbps, chol, fbs, restecg, \
     thalach, exang, oldpeak, slope, ca, thal, prediction, disease_probability, risk_level, \
     prediction_date";

/// SQLite storage adapter.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Create a store for the database file at `path`.
    ///
    /// Nothing is opened until the first call.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on a fresh connection off the async runtime.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            op(&conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let prediction: i64 = row.get(15)?;
    let disease_probability: f64 = row.get(16)?;
    let risk_level_str: String = row.get(17)?;
    let created_at_str: String = row.get(18)?;

    let features = ClinicalFeatures {
        age: row.get(2)?,
        sex: row.get(3)?,
        cp: row.get(4)?,
        trestbps: row.get(5)?,
        chol: row.get(6)?,
        fbs: row.get(7)?,
        restecg: row.get(8)?,
        thalach: row.get(9)?,
        exang: row.get(10)?,
        oldpeak: row.get(11)?,
        slope: row.get(12)?,
        ca: row.get(13)?,
        thal: row.get(14)?,
    };

    Ok(PredictionRecord {
        id: row.get(0)?,
        observation: PatientObservation::with_name(row.get::<_, String>(1)?, features),
        prediction: u8::from(prediction == 1),
        disease_probability,
        risk_level: RiskLevel::from_label(&risk_level_str)
            .unwrap_or_else(|| RiskLevel::from_probability(disease_probability)),
        created_at: parse_timestamp(18, &created_at_str)?,
    })
}

#[async_trait]
impl PredictionStore for SqliteStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        tracing::info!("SQLite schema ready at {:?}", self.path);
        Ok(())
    }

    async fn insert(
        &self,
        observation: &PatientObservation,
        classification: &Classification,
    ) -> Result<InsertReceipt, StorageError> {
        let observation = observation.clone();
        let classification = *classification;

        let receipt = self
            .with_connection(move |conn| {
                let f = &observation.features;
                let (id, created_at_str): (i64, String) = conn.query_row(
                    r"
                    INSERT INTO predictions (
                        patient_name, age, sex, cp, trestbps, chol, fbs, restecg,
                        thalach, exang, oldpeak, slope, ca, thal,
                        prediction, disease_probability, risk_level
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                    RETURNING id, prediction_date
                    ",
                    params![
                        observation.name,
                        f.age,
                        f.sex,
                        f.cp,
                        f.trestbps,
                        f.chol,
                        f.fbs,
                        f.restecg,
                        f.thalach,
                        f.exang,
                        f.oldpeak,
                        f.slope,
                        f.ca,
                        f.thal,
                        i64::from(classification.prediction),
                        classification.probability_disease,
                        classification.risk_level.as_str(),
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(InsertReceipt {
                    id,
                    created_at: parse_timestamp(1, &created_at_str)?,
                })
            })
            .await?;

        tracing::debug!("Saved prediction {} to SQLite", receipt.id);
        Ok(receipt)
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StorageError> {
        let limit = bounded_limit(limit) as i64;
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM predictions \
                 ORDER BY prediction_date DESC, id DESC LIMIT ?1"
            ))?;
            let records = stmt
                .query_map(params![limit], record_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.with_connection(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn observation(name: &str, age: i32) -> PatientObservation {
        PatientObservation::with_name(
            name,
            ClinicalFeatures {
                age,
                sex: 0,
                cp: 2,
                trestbps: 120,
                chol: 204,
                fbs: 0,
                restecg: 0,
                thalach: 172,
                exang: 0,
                oldpeak: 1.4,
                slope: 2,
                ca: 0,
                thal: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_insert_then_query_roundtrip() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("predictions.db"));
        store.ensure_schema().await.expect("Should create schema");

        let obs = observation("Jane Roe", 41);
        let classification = Classification::from_scores(1, [0.25, 0.75]);
        let receipt = store
            .insert(&obs, &classification)
            .await
            .expect("Should insert");
        assert!(receipt.id > 0);

        let rows = store.query_recent(1).await.expect("Should query");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, receipt.id);
        assert_eq!(row.observation, obs);
        assert_eq!(row.prediction, 1);
        assert!((row.disease_probability - 0.75).abs() < 1e-12);
        assert_eq!(row.risk_level, RiskLevel::High);
        assert_eq!(row.created_at, receipt.created_at);
    }

    #[tokio::test]
    async fn test_query_recent_is_bounded_and_ordered() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("predictions.db"));
        store.ensure_schema().await.expect("Should create schema");

        let classification = Classification::from_scores(0, [0.9, 0.1]);
        for age in 40..45 {
            store
                .insert(&observation("P", age), &classification)
                .await
                .expect("Should insert");
        }

        let rows = store.query_recent(3).await.expect("Should query");
        assert_eq!(rows.len(), 3);
        for pair in rows.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
            assert!(pair[0].id > pair[1].id);
        }
        // Newest first.
        assert_eq!(rows[0].observation.features.age, 44);

        // Zero is raised to one.
        assert_eq!(store.query_recent(0).await.expect("Should query").len(), 1);
        assert_eq!(store.count().await.expect("Should count"), 5);
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("predictions.db"));
        store.ensure_schema().await.expect("first");
        store.ensure_schema().await.expect("second");
        assert_eq!(store.count().await.expect("Should count"), 0);
    }

    #[tokio::test]
    async fn test_unknown_risk_text_is_recomputed() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("predictions.db"));
        store.ensure_schema().await.expect("Should create schema");

        let conn = Connection::open(store.path()).expect("open");
        conn.execute(
            "INSERT INTO predictions (patient_name, age, sex, cp, trestbps, chol, fbs, restecg,
                thalach, exang, oldpeak, slope, ca, thal, prediction, disease_probability, risk_level)
             VALUES ('Legacy', 60, 1, 0, 140, 260, 0, 1, 120, 1, 2.0, 1, 2, 3, 1, 0.55, 'moderate')",
            [],
        )
        .expect("raw insert");

        let rows = store.query_recent(1).await.expect("Should query");
        assert_eq!(rows[0].risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_unreachable_database_returns_errors() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("missing-dir").join("predictions.db"));

        assert!(store.ensure_schema().await.is_err());
        let classification = Classification::from_scores(0, [0.9, 0.1]);
        assert!(store
            .insert(&observation("X", 50), &classification)
            .await
            .is_err());
        assert!(store.query_recent(10).await.is_err());
        assert!(store.count().await.is_err());
    }

    #[tokio::test]
    async fn test_insert_without_schema_fails() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::new(temp.path().join("predictions.db"));
        let classification = Classification::from_scores(0, [0.9, 0.1]);
        assert!(store
            .insert(&observation("X", 50), &classification)
            .await
            .is_err());
    }
}
