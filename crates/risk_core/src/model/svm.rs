//! Kernel support vector classifier with Platt-scaled probabilities

use super::logistic;
use crate::errors::{Result, RiskError};
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

type Point = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Rbf {
        gamma: f64,
    },
    Poly {
        gamma: f64,
        #[serde(default)]
        coef0: f64,
        degree: u32,
    },
}

impl Kernel {
    fn apply(&self, a: &Point, b: &Point) -> f64 {
        match self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * dist).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(*degree as i32),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Kernel::Linear => Ok(()),
            Kernel::Rbf { gamma } | Kernel::Poly { gamma, .. } if !(gamma.is_finite() && *gamma > 0.0) => {
                Err(format!("Kernel gamma must be positive, got {gamma}"))
            }
            Kernel::Poly { coef0, .. } if !coef0.is_finite() => {
                Err("Kernel coef0 is not finite".to_string())
            }
            Kernel::Poly { degree: 0, .. } => Err("Polynomial kernel degree must be >= 1".to_string()),
            _ => Ok(()),
        }
    }
}

fn dot(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sigmoid calibration of the decision value: `p = 1 / (1 + exp(a * f + b))`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Platt {
    pub a: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SvmClassifier {
    pub kernel: Kernel,

    pub support_vectors: Vec<Point>,

    /// Signed dual coefficients, one per support vector
    pub dual_coef: Vec<f64>,

    pub intercept: f64,

    pub platt: Platt,
}

impl SvmClassifier {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.support_vectors.is_empty() {
            return Err("Classifier has no support vectors".to_string());
        }
        if self.support_vectors.len() != self.dual_coef.len() {
            return Err(format!(
                "{} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            ));
        }
        self.kernel.validate()?;

        let finite = self
            .support_vectors
            .iter()
            .flatten()
            .chain(&self.dual_coef)
            .chain([&self.intercept, &self.platt.a, &self.platt.b])
            .all(|v| v.is_finite());
        if !finite {
            return Err("Classifier parameters contain non-finite values".to_string());
        }

        Ok(())
    }

    /// Signed distance from the separating surface; positive leans towards the positive class
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let x = features.to_f64();
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel.apply(sv, &x))
            .sum::<f64>()
            + self.intercept
    }

    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        let decision = self.decision_function(features);
        let z = self.platt.a * decision + self.platt.b;
        if !z.is_finite() {
            return Err(RiskError::Inference(format!(
                "non-finite decision value {decision}"
            )));
        }
        Ok(logistic(-z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_model() -> SvmClassifier {
        // w = [1, 0, 0, 0, 0, 0] expressed with a single support vector
        SvmClassifier {
            kernel: Kernel::Linear,
            support_vectors: vec![[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
            dual_coef: vec![1.0],
            intercept: -1.0,
            platt: Platt { a: -2.0, b: 0.0 },
        }
    }

    #[test]
    fn test_linear_decision_and_probability() {
        let model = linear_model();
        assert!(model.validate().is_ok());

        let at_boundary = FeatureVector::from_codes([1, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(model.decision_function(&at_boundary), 0.0);
        assert!((model.predict_proba(&at_boundary).unwrap() - 0.5).abs() < 1e-12);

        let above = FeatureVector::from_codes([2, 0, 0, 0, 0, 0]).unwrap();
        assert!(model.predict_proba(&above).unwrap() > 0.5);

        let below = FeatureVector::from_codes([0, 0, 0, 0, 0, 0]).unwrap();
        assert!(model.predict_proba(&below).unwrap() < 0.5);
    }

    #[test]
    fn test_rbf_kernel_peaks_at_support_vector() {
        let kernel = Kernel::Rbf { gamma: 0.5 };
        let a = [1.0, 2.0, 0.0, 1.0, 0.0, 1.0];
        assert_eq!(kernel.apply(&a, &a), 1.0);
        let b = [0.0, 2.0, 0.0, 1.0, 0.0, 1.0];
        assert!((kernel.apply(&a, &b) - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_poly_kernel() {
        let kernel = Kernel::Poly {
            gamma: 1.0,
            coef0: 1.0,
            degree: 2,
        };
        let a = [1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(kernel.apply(&a, &a), 9.0);
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        let mut model = linear_model();
        model.dual_coef.push(0.5);
        assert!(model.validate().is_err());

        let mut model = linear_model();
        model.kernel = Kernel::Rbf { gamma: 0.0 };
        assert!(model.validate().is_err());

        let mut model = linear_model();
        model.intercept = f64::NAN;
        assert!(model.validate().is_err());

        let mut model = linear_model();
        model.support_vectors.clear();
        model.dual_coef.clear();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_support_vectors_must_have_six_columns() {
        let json = r#"{
            "kernel": {"type": "linear"},
            "support_vectors": [[1, 0, 0, 0, 0]],
            "dual_coef": [1.0],
            "intercept": 0.0,
            "platt": {"a": -1.0, "b": 0.0}
        }"#;
        assert!(serde_json::from_str::<SvmClassifier>(json).is_err());
    }
}
