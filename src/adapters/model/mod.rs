//! Model artifact adapter: loads the serialized classifier bundle.
//!
//! The artifact is a JSON document in one of two shapes:
//!
//! - a classifier object tagged by `"type"` (direct model), or
//! - a mapping with the classifier under `"model"` plus optional
//!   `"feature_names"`, `"model_name"` and `"accuracy"` (bundled model).
//!
//! The shape is resolved once here into [`LoadedModel`]. A file with no
//! usable classifier is a fatal startup error: the service never serves
//! predictions without a model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::default_feature_order;
use crate::ports::{Classifier, ScoringError};

mod forest;
mod logistic;

pub use forest::{DecisionTree, RandomForestModel};
pub use logistic::LogisticRegressionModel;

/// File names tried, in order, when the artifact path is a directory.
const CANDIDATE_FILES: [&str; 2] = ["heart_disease_model.json", "model.json"];

/// Key a bundled artifact stores its classifier under.
const BUNDLE_MODEL_KEY: &str = "model";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No object with a scoring capability found in model artifact: {0}")]
    NoScoringCapability(String),

    #[error("Invalid model structure: {0}")]
    InvalidModel(String),
}

/// Classifier families this service can score with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression(LogisticRegressionModel),
    RandomForest(RandomForestModel),
}

impl ClassifierModel {
    /// Parse and structurally validate a classifier object.
    fn from_value(value: Value) -> Result<Self, ArtifactError> {
        let model: Self = serde_json::from_value(value)
            .map_err(|e| ArtifactError::NoScoringCapability(e.to_string()))?;
        match &model {
            Self::LogisticRegression(m) => m.validate()?,
            Self::RandomForest(m) => m.validate()?,
        }
        Ok(model)
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::LogisticRegression(m) => m,
            Self::RandomForest(m) => m,
        }
    }
}

impl Classifier for ClassifierModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ScoringError> {
        self.inner().predict_proba(row)
    }

    fn predict(&self, row: &[f64]) -> Result<u8, ScoringError> {
        self.inner().predict(row)
    }

    fn kind_name(&self) -> &'static str {
        self.inner().kind_name()
    }
}

#[derive(Debug, Deserialize)]
struct BundleMetadata {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    accuracy: Option<f64>,
}

/// Artifact shape, resolved once at load time.
#[derive(Debug, Clone)]
pub enum LoadedModel {
    /// The document itself is the classifier.
    DirectModel(ClassifierModel),
    /// The classifier sits under `"model"` next to its metadata.
    BundledModel {
        model: ClassifierModel,
        feature_names: Option<Vec<String>>,
        model_name: Option<String>,
        accuracy: Option<f64>,
    },
}

impl LoadedModel {
    /// Decide which shape a parsed document has.
    ///
    /// # Errors
    /// Returns `NoScoringCapability` if neither shape yields a classifier.
    pub fn resolve(value: Value) -> Result<Self, ArtifactError> {
        let Value::Object(mut map) = value else {
            return Err(ArtifactError::NoScoringCapability(
                "artifact root is not a JSON object".into(),
            ));
        };

        if map.contains_key("type") {
            return Ok(Self::DirectModel(ClassifierModel::from_value(Value::Object(
                map,
            ))?));
        }

        let Some(model_value) = map.remove(BUNDLE_MODEL_KEY) else {
            return Err(ArtifactError::NoScoringCapability(format!(
                "expected a classifier tagged with \"type\" or a mapping with a \"{BUNDLE_MODEL_KEY}\" key"
            )));
        };
        let model = ClassifierModel::from_value(model_value)?;
        let meta: BundleMetadata = serde_json::from_value(Value::Object(map))?;

        Ok(Self::BundledModel {
            model,
            feature_names: meta.feature_names,
            model_name: meta.model_name,
            accuracy: meta.accuracy,
        })
    }
}

/// Which artifact shape was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Direct,
    Bundled,
}

/// The loaded model plus its metadata. Read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    classifier: ClassifierModel,
    feature_names: Vec<String>,
    model_name: String,
    accuracy: Option<f64>,
    kind: ArtifactKind,
    fingerprint: String,
}

impl ModelArtifact {
    /// Load an artifact from a file, or from a directory holding one of the
    /// known artifact file names.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not JSON, or carries no
    /// valid classifier.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact_path = Self::locate(path)?;
        let bytes = std::fs::read(&artifact_path).map_err(|source| ArtifactError::Io {
            path: artifact_path.clone(),
            source,
        })?;

        let artifact = Self::from_slice(&bytes)?;

        tracing::info!(
            "Loaded model artifact from {:?} (kind={:?}, model={}, n_features={}, sha256={})",
            artifact_path,
            artifact.kind,
            artifact.model_name,
            artifact.feature_names.len(),
            artifact.fingerprint
        );
        Ok(artifact)
    }

    /// Parse an artifact from raw bytes.
    ///
    /// # Errors
    /// Same as [`ModelArtifact::load`], minus I/O.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let loaded = LoadedModel::resolve(value)?;
        Ok(Self::from_loaded(loaded, sha256_hex_bytes(bytes)))
    }

    /// Fill in metadata defaults for a resolved artifact.
    #[must_use]
    pub fn from_loaded(loaded: LoadedModel, fingerprint: String) -> Self {
        let (classifier, feature_names, model_name, accuracy, kind) = match loaded {
            LoadedModel::DirectModel(model) => (model, None, None, None, ArtifactKind::Direct),
            LoadedModel::BundledModel {
                model,
                feature_names,
                model_name,
                accuracy,
            } => (
                model,
                feature_names,
                model_name,
                accuracy,
                ArtifactKind::Bundled,
            ),
        };

        let feature_names = match feature_names {
            Some(names) if !names.is_empty() => names,
            _ => {
                tracing::info!("Artifact has no feature names, using default clinical ordering");
                default_feature_order()
            }
        };
        let model_name = model_name.unwrap_or_else(|| classifier.kind_name().to_string());

        Self {
            classifier,
            feature_names,
            model_name,
            accuracy,
            kind,
            fingerprint,
        }
    }

    fn locate(path: &Path) -> Result<PathBuf, ArtifactError> {
        if !path.is_dir() {
            return Ok(path.to_path_buf());
        }
        CANDIDATE_FILES
            .iter()
            .map(|name| path.join(name))
            .find(|p| p.exists())
            .ok_or_else(|| {
                ArtifactError::NoScoringCapability(format!(
                    "no model file in {path:?} (expected one of {CANDIDATE_FILES:?})"
                ))
            })
    }

    #[must_use]
    pub fn classifier(&self) -> &ClassifierModel {
        &self.classifier
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// SHA-256 of the artifact bytes, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
