//! PostgreSQL adapter: production implementation of `PredictionStore`.
//!
//! Every call opens a dedicated connection from the configured host, port,
//! user, password and database name, runs its statement and closes the
//! connection. Single statements run in autocommit mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};

use crate::adapters::StorageError;
use crate::config::DatabaseConfig;
use crate::domain::{
    ClinicalFeatures, Classification, InsertReceipt, PatientObservation, PredictionRecord,
    RiskLevel,
};
use crate::ports::{bounded_limit, PredictionStore};

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS predictions (
        id BIGSERIAL PRIMARY KEY,
        patient_name VARCHAR(100) NOT NULL,
        age INTEGER NOT NULL,
        sex INTEGER NOT NULL,
        cp INTEGER NOT NULL,
        trestbps INTEGER NOT NULL,
        chol INTEGER NOT NULL,
        fbs INTEGER NOT NULL,
        restecg INTEGER NOT NULL,
        thalach INTEGER NOT NULL,
        exang INTEGER NOT NULL,
        oldpeak DOUBLE PRECISION NOT NULL,
        slope INTEGER NOT NULL,
        ca INTEGER NOT NULL,
        thal INTEGER NOT NULL,
        prediction INTEGER NOT NULL,
        disease_probability DOUBLE PRECISION NOT NULL,
        risk_level VARCHAR(20) NOT NULL,
        prediction_date TIMESTAMPTZ NOT NULL DEFAULT now()
    )
";

const CREATE_INDEX: &str = r"
    CREATE INDEX IF NOT EXISTS idx_predictions_date
        ON predictions (prediction_date DESC)
";

const INSERT: &str = r"
    INSERT INTO predictions (
        patient_name, age, sex, cp, trestbps, chol, fbs, restecg,
        thalach, exang, oldpeak, slope, ca, thal,
        prediction, disease_probability, risk_level
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    RETURNING id, prediction_date
";

const SELECT_RECENT: &str = r"
    SELECT id, patient_name, age, sex, cp, trestbps, chol, fbs, restecg,
           thalach, exang, oldpeak, slope, ca, thal,
           prediction, disease_probability, risk_level, prediction_date
    FROM predictions
    ORDER BY prediction_date DESC, id DESC
    LIMIT $1
";

/// PostgreSQL storage adapter.
pub struct PostgresStore {
    config: DatabaseConfig,
}

impl PostgresStore {
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<PgConnection, StorageError> {
        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(self.config.password())
            .database(&self.config.name);
        Ok(PgConnection::connect_with(&options).await?)
    }
}

/// Close a connection; a failed goodbye does not undo a committed statement.
async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!("Closing PostgreSQL connection failed: {}", e);
    }
}

fn record_from_row(row: &PgRow) -> Result<PredictionRecord, sqlx::Error> {
    let prediction: i32 = row.try_get("prediction")?;
    let disease_probability: f64 = row.try_get("disease_probability")?;
    let risk_level_str: String = row.try_get("risk_level")?;

    let features = ClinicalFeatures {
        age: row.try_get("age")?,
        sex: row.try_get("sex")?,
        cp: row.try_get("cp")?,
        trestbps: row.try_get("trestbps")?,
        chol: row.try_get("chol")?,
        fbs: row.try_get("fbs")?,
        restecg: row.try_get("restecg")?,
        thalach: row.try_get("thalach")?,
        exang: row.try_get("exang")?,
        oldpeak: row.try_get("oldpeak")?,
        slope: row.try_get("slope")?,
        ca: row.try_get("ca")?,
        thal: row.try_get("thal")?,
    };

    Ok(PredictionRecord {
        id: row.try_get("id")?,
        observation: PatientObservation::with_name(
            row.try_get::<String, _>("patient_name")?,
            features,
        ),
        prediction: u8::from(prediction == 1),
        disease_probability,
        risk_level: RiskLevel::from_label(&risk_level_str)
            .unwrap_or_else(|| RiskLevel::from_probability(disease_probability)),
        created_at: row.try_get::<DateTime<Utc>, _>("prediction_date")?,
    })
}

#[async_trait]
impl PredictionStore for PostgresStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let result = async {
            sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
            sqlx::query(CREATE_INDEX).execute(&mut conn).await?;
            Ok::<_, sqlx::Error>(())
        }
        .await;
        close(conn).await;
        result?;

        tracing::info!(
            "PostgreSQL schema ready on {}:{}/{}",
            self.config.host,
            self.config.port,
            self.config.name
        );
        Ok(())
    }

    async fn insert(
        &self,
        observation: &PatientObservation,
        classification: &Classification,
    ) -> Result<InsertReceipt, StorageError> {
        let mut conn = self.connect().await?;
        let f = &observation.features;

        let result = sqlx::query(INSERT)
            .bind(&observation.name)
            .bind(f.age)
            .bind(f.sex)
            .bind(f.cp)
            .bind(f.trestbps)
            .bind(f.chol)
            .bind(f.fbs)
            .bind(f.restecg)
            .bind(f.thalach)
            .bind(f.exang)
            .bind(f.oldpeak)
            .bind(f.slope)
            .bind(f.ca)
            .bind(f.thal)
            .bind(i32::from(classification.prediction))
            .bind(classification.probability_disease)
            .bind(classification.risk_level.as_str())
            .fetch_one(&mut conn)
            .await;
        close(conn).await;

        let row = result?;
        let receipt = InsertReceipt {
            id: row.try_get("id")?,
            created_at: row.try_get("prediction_date")?,
        };

        tracing::debug!("Saved prediction {} to PostgreSQL", receipt.id);
        Ok(receipt)
    }

    async fn query_recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StorageError> {
        let limit = bounded_limit(limit) as i64;
        let mut conn = self.connect().await?;
        let result = sqlx::query(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&mut conn)
            .await;
        close(conn).await;

        let records = result?
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let mut conn = self.connect().await?;
        let result: Result<i64, sqlx::Error> =
            sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
                .fetch_one(&mut conn)
                .await;
        close(conn).await;
        Ok(result?.max(0) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
