//! Classifier artifacts
//!
//! A trained model is shipped as a JSON artifact:
//!
//! ```json
//! {
//!   "version": 1,
//!   "feature_names": ["Age", "educational level", "Regular exercise",
//!                     "DCCN", "Malnutrition", "Depressive"],
//!   "classifier": {
//!     "type": "svm",
//!     "kernel": {"type": "rbf", "gamma": 0.1},
//!     "support_vectors": [[0, 1, 0, 1, 0, 0]],
//!     "dual_coef": [0.8],
//!     "intercept": -0.2,
//!     "platt": {"a": -1.7, "b": 0.1}
//!   }
//! }
//! ```
//!
//! `feature_names` must match [`FeatureDictionary::ordered_feature_identifiers`]
//! exactly, so a model trained on a different column order is refused at
//! load time instead of silently mispredicting.

pub mod gbdt;
pub mod svm;

use crate::errors::{ModelLoadError, Result};
use crate::features::{FeatureDictionary, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use gbdt::{GbdtClassifier, Node, Tree};
pub use svm::{Kernel, Platt, SvmClassifier};

/// Supported artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

/// Anything that can turn a feature vector into a positive-class probability
pub trait RiskModel: Send + Sync {
    /// Probability of the positive class, expected in `[0, 1]`
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64>;

    /// Short name of the model family, used in logs and health output
    fn kind(&self) -> &'static str;
}

/// Numerically stable logistic function
pub(crate) fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Classifier {
    Svm(SvmClassifier),
    Gbdt(GbdtClassifier),
}

impl Classifier {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Classifier::Svm(model) => model.validate(),
            Classifier::Gbdt(model) => model.validate(),
        }
    }
}

impl RiskModel for Classifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        match self {
            Classifier::Svm(model) => model.predict_proba(features),
            Classifier::Gbdt(model) => model.predict_proba(features),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Classifier::Svm(_) => "svm",
            Classifier::Gbdt(_) => "gbdt",
        }
    }
}

/// Serialized form of a trained classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    pub version: u32,

    /// Column names in the order the model was trained on
    pub feature_names: Vec<String>,

    pub classifier: Classifier,
}

impl ModelArtifact {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            feature_names: FeatureDictionary::standard()
                .ordered_feature_identifiers()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            classifier,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ModelLoadError> {
        if self.version != ARTIFACT_VERSION {
            return Err(ModelLoadError::Invalid(format!(
                "Unsupported artifact version: {}",
                self.version
            )));
        }

        let expected = FeatureDictionary::standard().ordered_feature_identifiers();
        if self.feature_names.iter().map(String::as_str).ne(expected) {
            return Err(ModelLoadError::FeatureMismatch {
                expected: expected.iter().map(|s| s.to_string()).collect(),
                found: self.feature_names.clone(),
            });
        }

        self.classifier.validate().map_err(ModelLoadError::Invalid)
    }

    pub fn from_json_str(json: &str) -> std::result::Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> std::result::Result<String, ModelLoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A validated classifier together with the hash of the bytes it came from
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn RiskModel>,
    pub hash: String,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("kind", &self.model.kind())
            .field("hash", &self.hash)
            .finish()
    }
}

/// Read, parse and validate an artifact from disk
pub fn load_artifact<P: AsRef<Path>>(path: P) -> std::result::Result<LoadedModel, ModelLoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json = std::str::from_utf8(&bytes)
        .map_err(|e| ModelLoadError::Invalid(format!("Artifact is not UTF-8: {e}")))?;

    let artifact = ModelArtifact::from_json_str(json)?;
    let hash = hex::encode(blake3::hash(&bytes).as_bytes());
    info!(
        path = %path.display(),
        kind = artifact.classifier.kind(),
        %hash,
        "Loaded model artifact"
    );

    Ok(LoadedModel {
        model: Arc::new(artifact.classifier),
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svm_artifact() -> ModelArtifact {
        ModelArtifact::new(Classifier::Svm(SvmClassifier {
            kernel: Kernel::Rbf { gamma: 0.2 },
            support_vectors: vec![[2.0, 0.0, 0.0, 1.0, 1.0, 1.0], [0.0, 3.0, 1.0, 0.0, 0.0, 0.0]],
            dual_coef: vec![1.0, -1.0],
            intercept: 0.0,
            platt: Platt { a: -1.5, b: 0.0 },
        }))
    }

    #[test]
    fn test_logistic() {
        assert_eq!(logistic(0.0), 0.5);
        assert!(logistic(800.0) <= 1.0);
        assert!(logistic(-800.0) >= 0.0);
        assert!((logistic(1.0) + logistic(-1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_artifact_json_round_trip_keeps_predictions() {
        let artifact = svm_artifact();
        let restored = ModelArtifact::from_json_str(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(artifact, restored);

        let v = FeatureVector::from_codes([2, 0, 0, 1, 1, 1]).unwrap();
        assert_eq!(
            artifact.classifier.predict_proba(&v).unwrap(),
            restored.classifier.predict_proba(&v).unwrap()
        );
    }

    #[test]
    fn test_column_order_is_enforced() {
        let mut artifact = svm_artifact();
        artifact.feature_names.swap(0, 1);
        assert!(matches!(
            artifact.validate(),
            Err(ModelLoadError::FeatureMismatch { .. })
        ));

        let mut artifact = svm_artifact();
        artifact.feature_names.pop();
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_version_is_checked() {
        let mut artifact = svm_artifact();
        artifact.version = 2;
        assert!(matches!(artifact.validate(), Err(ModelLoadError::Invalid(_))));
    }

    #[test]
    fn test_unknown_classifier_type_is_rejected() {
        let json = r#"{"version":1,"feature_names":[],"classifier":{"type":"forest"}}"#;
        assert!(matches!(
            ModelArtifact::from_json_str(json),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_load_artifact_hashes_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let json = svm_artifact().to_json().unwrap();
        std::fs::write(&path, &json).unwrap();

        let loaded = load_artifact(&path).unwrap();
        assert_eq!(loaded.model.kind(), "svm");
        assert_eq!(loaded.hash, hex::encode(blake3::hash(json.as_bytes()).as_bytes()));
        assert_eq!(loaded.hash.len(), 64);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifact(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }
}
