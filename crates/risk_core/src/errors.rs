//! Error types for the risk core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a submission into a prediction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Submitted field name is not the label of any feature
    #[error("Unknown feature: {label}")]
    UnknownFeature { label: String },

    /// Option label is not part of the feature's closed option set
    #[error("Unknown option '{option}' for feature {feature}")]
    UnknownOption { feature: &'static str, option: String },

    /// A required feature was not submitted
    #[error("Missing feature: {feature}")]
    MissingFeature { feature: &'static str },

    /// The same feature was submitted more than once
    #[error("Feature submitted more than once: {feature}")]
    DuplicateFeature { feature: &'static str },

    /// The classifier produced an unusable output
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl RiskError {
    /// True for errors caused by the submitted data rather than the server
    pub fn is_validation(&self) -> bool {
        !matches!(self, RiskError::Inference(_))
    }
}

/// Errors raised while loading a classifier artifact
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("Model columns {found:?} do not match expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Result type for risk core operations
pub type Result<T> = std::result::Result<T, RiskError>;
