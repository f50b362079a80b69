//! Startup wiring: artifact, store and service.

use std::sync::Arc;

use crate::adapters::{ModelArtifact, PostgresStore, SqliteStore};
use crate::api::AppState;
use crate::application::{PredictionService, RiskClassifier};
use crate::config::{DatabaseConfig, ServerConfig, StorageBackend};
use crate::domain::{ClinicalFeatures, PatientObservation};
use crate::ports::PredictionStore;

/// Observation scored once at startup to prove the model is usable.
fn probe_observation() -> PatientObservation {
    PatientObservation::new(ClinicalFeatures {
        age: 63,
        sex: 1,
        cp: 3,
        trestbps: 145,
        chol: 233,
        fbs: 1,
        restecg: 0,
        thalach: 150,
        exang: 0,
        oldpeak: 2.3,
        slope: 0,
        ca: 0,
        thal: 1,
    })
}

/// Build the store selected by `config`.
pub fn build_store(config: &DatabaseConfig) -> Arc<dyn PredictionStore> {
    match config.backend {
        StorageBackend::Postgres => Arc::new(PostgresStore::new(config.clone())),
        StorageBackend::Sqlite => {
            if let Some(parent) = config.sqlite_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Could not create SQLite directory {:?}: {}", parent, e);
                }
            }
            Arc::new(SqliteStore::new(&config.sqlite_path))
        }
    }
}

/// Load the artifact and check it can score a row.
///
/// # Errors
/// Returns error if the artifact cannot be loaded or fails the self-check.
pub fn load_artifact(config: &ServerConfig) -> crate::Result<Arc<ModelArtifact>> {
    let artifact = Arc::new(ModelArtifact::load(&config.model_path)?);
    let probe = RiskClassifier::new(Arc::clone(&artifact)).classify_default(&probe_observation())?;
    tracing::info!(
        "Model self-check passed: p_disease={:.3} ({})",
        probe.probability_disease,
        probe.risk_level
    );
    Ok(artifact)
}

/// Assemble the application state.
///
/// Schema creation failure is logged and tolerated; requests then degrade to
/// unsaved predictions and empty listings.
///
/// # Errors
/// Returns error only for artifact problems.
pub async fn build_state(config: &ServerConfig) -> crate::Result<AppState> {
    let artifact = load_artifact(config)?;
    let store = build_store(&config.database);

    if let Err(e) = store.ensure_schema().await {
        tracing::error!(
            "Could not prepare {} schema, predictions will not be saved until it is reachable: {}",
            store.backend_name(),
            e
        );
    }

    let service = Arc::new(PredictionService::new(artifact, store));
    Ok(AppState::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_build_state_with_sqlite_backend() {
        let temp = tempdir().expect("tempdir");
        let model_path = temp.path().join("model.json");
        std::fs::write(
            &model_path,
            serde_json::to_vec(&json!({
                "type": "logistic_regression",
                "coefficients": vec![0.01; 13],
                "intercept": 0.0
            }))
            .expect("serialize"),
        )
        .expect("write");
        let db_path = temp.path().join("nested").join("predictions.db");

        let config = ServerConfig::try_parse_from([
            "heartscore",
            "--model-path",
            model_path.to_str().expect("utf8 path"),
            "--db-backend",
            "sqlite",
            "--sqlite-path",
            db_path.to_str().expect("utf8 path"),
        ])
        .expect("Should parse");

        let state = build_state(&config).await.expect("Should build state");
        assert!(db_path.exists());
        assert_eq!(state.service.model_info().model_name, "Logistic Regression");
    }

    #[test]
    fn test_width_mismatch_fails_self_check() {
        let temp = tempdir().expect("tempdir");
        let model_path = temp.path().join("model.json");
        std::fs::write(
            &model_path,
            serde_json::to_vec(&json!({
                "type": "logistic_regression",
                "coefficients": vec![0.01; 5],
                "intercept": 0.0
            }))
            .expect("serialize"),
        )
        .expect("write");

        let config = ServerConfig::try_parse_from([
            "heartscore",
            "--model-path",
            model_path.to_str().expect("utf8 path"),
        ])
        .expect("Should parse");

        assert!(matches!(
            load_artifact(&config),
            Err(crate::HeartscoreError::Scoring(_))
        ));
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let config = ServerConfig::try_parse_from([
            "heartscore",
            "--model-path",
            "/nonexistent/heartscore/model.json",
        ])
        .expect("Should parse");
        assert!(matches!(
            load_artifact(&config),
            Err(crate::HeartscoreError::Artifact(_))
        ));
    }
}
