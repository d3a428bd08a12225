//! Submission-to-tier scenarios against stub and artifact-backed models

use riskcalc_core::model::{GbdtClassifier, Node, Tree};
use riskcalc_core::{
    assess, Classifier, FeatureDictionary, FeatureVector, Locale, ModelAdapter, ModelArtifact,
    PredictionSource, RiskError, RiskModel, RiskTier,
};
use std::sync::{Arc, Mutex};

/// Returns a fixed probability and remembers the last vector it saw
struct StubModel {
    probability: f64,
    seen: Mutex<Option<FeatureVector>>,
}

impl StubModel {
    fn new(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability,
            seen: Mutex::new(None),
        })
    }
}

impl RiskModel for StubModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        *self.seen.lock().unwrap() = Some(*features);
        Ok(self.probability)
    }

    fn kind(&self) -> &'static str {
        "stub"
    }
}

fn baseline() -> Vec<(&'static str, &'static str)> {
    vec![
        ("年龄", "60-69岁"),
        ("文化程度", "小学及以下"),
        ("规律运动", "否"),
        ("糖尿病慢性并发症数量", "<2个"),
        ("营养不良", "否"),
        ("抑郁", "否"),
    ]
}

#[test]
fn loaded_model_at_42_percent_is_low_risk() {
    let dict = FeatureDictionary::standard();
    let adapter = ModelAdapter::with_model(StubModel::new(0.42));

    let assessment = assess(&dict, &adapter, baseline()).unwrap();
    assert_eq!(assessment.formatted_probability(), "42.0%");
    assert_eq!(assessment.tier, RiskTier::Low);
    assert_eq!(assessment.tier_label(Locale::ZhCn), "低风险");
    assert!(!assessment.is_degraded());
}

#[test]
fn unloaded_model_reports_moderate_at_50_percent() {
    let dict = FeatureDictionary::standard();
    let adapter = ModelAdapter::degraded("no artifact");

    let assessment = assess(&dict, &adapter, baseline()).unwrap();
    assert_eq!(assessment.percent, 50.0);
    assert_eq!(assessment.formatted_probability(), "50.0%");
    assert_eq!(assessment.tier, RiskTier::Moderate);
    assert_eq!(assessment.tier_label(Locale::ZhCn), "中风险");
    assert_eq!(assessment.source, PredictionSource::Fallback);
}

#[test]
fn missing_feature_never_reaches_the_model() {
    let dict = FeatureDictionary::standard();
    let stub = StubModel::new(0.9);
    let adapter = ModelAdapter::with_model(stub.clone());

    let mut pairs = baseline();
    pairs.remove(2);
    let err = assess(&dict, &adapter, pairs).unwrap_err();

    assert_eq!(
        err,
        RiskError::MissingFeature {
            feature: "Regular exercise"
        }
    );
    assert!(stub.seen.lock().unwrap().is_none());
}

#[test]
fn model_sees_column_order_regardless_of_submission_order() {
    let dict = FeatureDictionary::standard();
    let stub = StubModel::new(0.7);
    let adapter = ModelAdapter::with_model(stub.clone());

    let shuffled = vec![
        ("抑郁", "是"),
        ("Age", "80 years and above"),
        ("营养不良", "否"),
        ("文化程度", "初中"),
        ("糖尿病慢性并发症数量", "≥2个"),
        ("规律运动", "是"),
    ];
    let assessment = assess(&dict, &adapter, shuffled).unwrap();
    assert_eq!(assessment.tier, RiskTier::High);

    let seen = stub.seen.lock().unwrap().unwrap();
    assert_eq!(seen.codes(), &[2, 1, 1, 1, 0, 1]);
}

#[test]
fn boosted_tree_artifact_end_to_end() {
    // Complications >= 2 adds +2.0 to the margin, otherwise -1.0
    let tree = Tree::new(
        vec![
            Node::internal(0, 3, 0.5, 1, 2),
            Node::leaf(1, -1.0),
            Node::leaf(2, 2.0),
        ],
        1.0,
    );
    let artifact = ModelArtifact::new(Classifier::Gbdt(GbdtClassifier::new(vec![tree], 0.0)));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("risk_model.json");
    std::fs::write(&path, artifact.to_json().unwrap()).unwrap();

    let adapter = ModelAdapter::load(&path);
    assert!(!adapter.is_degraded());

    let dict = FeatureDictionary::standard();
    let low = assess(&dict, &adapter, baseline()).unwrap();
    assert_eq!(low.tier, RiskTier::Low);
    assert_eq!(low.formatted_probability(), "26.9%");

    let mut pairs = baseline();
    pairs[3].1 = "≥2个";
    let high = assess(&dict, &adapter, pairs).unwrap();
    assert_eq!(high.tier, RiskTier::High);
    assert_eq!(high.formatted_probability(), "88.1%");
}

#[test]
fn missing_artifact_degrades_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = ModelAdapter::load(dir.path().join("svm_model.json"));
    assert!(adapter.is_degraded());

    let dict = FeatureDictionary::standard();
    let assessment = assess(&dict, &adapter, baseline()).unwrap();
    assert_eq!(assessment.tier, RiskTier::Moderate);
}
