//! Model adapter with degraded-mode fallback
//!
//! The adapter owns the process-wide classifier. When the artifact cannot be
//! loaded the adapter keeps serving with a fixed fallback probability, and
//! every prediction records which of the two paths produced it.

use crate::errors::{ModelLoadError, Result, RiskError};
use crate::features::FeatureVector;
use crate::model::{load_artifact, LoadedModel, RiskModel};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, warn};

/// Probability reported while no model is loaded
pub const FALLBACK_PROBABILITY: f64 = 0.5;

/// Where a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Model,
    Fallback,
}

impl PredictionSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Positive-class probability in `[0, 1]`
    pub probability: f64,
    pub source: PredictionSource,
}

impl Prediction {
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }

    pub fn is_degraded(&self) -> bool {
        self.source == PredictionSource::Fallback
    }
}

/// Loaded-or-degraded state, reported by health checks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ModelStatus {
    Loaded { kind: &'static str, hash: String },
    Degraded { reason: String },
}

#[derive(Clone)]
pub struct ModelAdapter {
    model: Option<Arc<dyn RiskModel>>,
    status: ModelStatus,
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("status", &self.status)
            .finish()
    }
}

impl ModelAdapter {
    /// Load the artifact at `path`, entering degraded mode on any failure
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(loaded) => Self::from_loaded(loaded),
            Err(err) => {
                error!(
                    path = %path.as_ref().display(),
                    error = %err,
                    "Model load failed; serving fallback predictions"
                );
                Self::degraded(err.to_string())
            }
        }
    }

    pub fn try_load<P: AsRef<Path>>(path: P) -> std::result::Result<LoadedModel, ModelLoadError> {
        load_artifact(path)
    }

    pub fn from_loaded(loaded: LoadedModel) -> Self {
        metrics::gauge!("riskcalc_model_loaded").set(1.0);
        Self {
            status: ModelStatus::Loaded {
                kind: loaded.model.kind(),
                hash: loaded.hash,
            },
            model: Some(loaded.model),
        }
    }

    /// Wrap an in-memory model, e.g. a test double
    pub fn with_model(model: Arc<dyn RiskModel>) -> Self {
        Self {
            status: ModelStatus::Loaded {
                kind: model.kind(),
                hash: String::new(),
            },
            model: Some(model),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        metrics::gauge!("riskcalc_model_loaded").set(0.0);
        Self {
            model: None,
            status: ModelStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let prediction = match &self.model {
            Some(model) => {
                let probability = model.predict_proba(features)?;
                if !(0.0..=1.0).contains(&probability) {
                    return Err(RiskError::Inference(format!(
                        "probability {probability} outside [0, 1]"
                    )));
                }
                Prediction {
                    probability,
                    source: PredictionSource::Model,
                }
            }
            None => {
                warn!("Using fallback prediction; model is not loaded");
                Prediction {
                    probability: FALLBACK_PROBABILITY,
                    source: PredictionSource::Fallback,
                }
            }
        };

        metrics::counter!("riskcalc_predictions_total", "source" => prediction.source.as_str())
            .increment(1);
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RiskModel for Fixed {
        fn predict_proba(&self, _: &FeatureVector) -> Result<f64> {
            Ok(self.0)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    fn any_vector() -> FeatureVector {
        FeatureVector::from_codes([0; 6]).unwrap()
    }

    #[test]
    fn test_degraded_mode_returns_fallback() {
        let adapter = ModelAdapter::degraded("missing");
        let prediction = adapter.predict(&any_vector()).unwrap();
        assert_eq!(prediction.probability, FALLBACK_PROBABILITY);
        assert_eq!(prediction.percent(), 50.0);
        assert!(prediction.is_degraded());
        assert!(adapter.is_degraded());
    }

    #[test]
    fn test_loaded_model_is_used() {
        let adapter = ModelAdapter::with_model(Arc::new(Fixed(0.42)));
        let prediction = adapter.predict(&any_vector()).unwrap();
        assert_eq!(prediction.source, PredictionSource::Model);
        assert_eq!(prediction.probability, 0.42);
        assert!(matches!(adapter.status(), ModelStatus::Loaded { kind: "fixed", .. }));
    }

    #[test]
    fn test_out_of_range_output_is_an_error() {
        for bad in [1.5, -0.1, f64::NAN] {
            let adapter = ModelAdapter::with_model(Arc::new(Fixed(bad)));
            assert!(matches!(
                adapter.predict(&any_vector()),
                Err(RiskError::Inference(_))
            ));
        }
    }

    #[test]
    fn test_load_failure_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "not json").unwrap();

        let adapter = ModelAdapter::load(&path);
        assert!(adapter.is_degraded());
        match adapter.status() {
            ModelStatus::Degraded { reason } => assert!(reason.contains("parse")),
            other => panic!("unexpected status {other:?}"),
        }
    }
}
