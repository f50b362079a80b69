//! # heartscore
//!
//! Heart disease risk prediction served over HTTP.
//!
//! A pre-trained binary classifier scores thirteen clinical features, the
//! disease probability is bucketed into a risk level and every prediction is
//! stored for later listing and statistics.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (observations, classifications, stored records)
//! - `ports`: Trait definitions for scoring and persistence
//! - `adapters`: Concrete implementations (model artifacts, PostgreSQL, SQLite, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `api`: axum router and handlers
//! - `config`: Command-line and environment settings
//! - `startup`: Wiring configuration into a ready `AppState`

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod startup;

pub use domain::{Classification, PatientObservation, RiskLevel};

/// Result type for heartscore operations
pub type Result<T> = std::result::Result<T, HeartscoreError>;

/// Main error type for heartscore
#[derive(Debug, thiserror::Error)]
pub enum HeartscoreError {
    #[error("Model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Model failed its startup self-check: {0}")]
    Scoring(#[from] ports::ScoringError),
}
