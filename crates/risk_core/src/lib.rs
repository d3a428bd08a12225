//! Risk calculator core
//!
//! Turns six categorical answers into a risk percentage and tier.
//!
//! Modules:
//! - `features`: closed label/code dictionary and the model input vector
//! - `model`: classifier artifacts (kernel SVM, boosted trees)
//! - `adapter`: process-wide model handle with degraded-mode fallback
//! - `tier`: probability to risk-tier classification
//! - `assessment`: the encode, predict, classify pipeline
//! - `locale`: supported display languages

pub mod adapter;
pub mod assessment;
pub mod errors;
pub mod features;
pub mod locale;
pub mod model;
pub mod tier;

pub use adapter::{ModelAdapter, ModelStatus, Prediction, PredictionSource, FALLBACK_PROBABILITY};
pub use assessment::{assess, Assessment};
pub use errors::{ModelLoadError, RiskError};
pub use features::{FeatureDictionary, FeatureId, FeatureVector, OptionSpec, FEATURE_COUNT};
pub use locale::{Locale, UnsupportedLocale};
pub use model::{load_artifact, Classifier, LoadedModel, ModelArtifact, RiskModel};
pub use tier::RiskTier;

/// Crate version string for health reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
