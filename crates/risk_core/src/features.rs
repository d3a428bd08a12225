//! Feature dictionary for the six categorical risk factors
//!
//! Maps localized feature labels to internal column identifiers and
//! localized option labels to the integer codes the classifier was trained
//! on. The table is closed: anything not listed here is rejected.

use crate::errors::{Result, RiskError};
use crate::locale::Locale;
use std::collections::{HashMap, HashSet};

/// Number of model input columns
pub const FEATURE_COUNT: usize = 6;

/// The six risk factors, declared in model column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureId {
    Age,
    EducationLevel,
    RegularExercise,
    Dccn,
    Malnutrition,
    Depressive,
}

impl FeatureId {
    /// All features in model column order
    pub const ALL: [FeatureId; FEATURE_COUNT] = [
        FeatureId::Age,
        FeatureId::EducationLevel,
        FeatureId::RegularExercise,
        FeatureId::Dccn,
        FeatureId::Malnutrition,
        FeatureId::Depressive,
    ];

    /// Column position in the model input vector
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Internal identifier, identical to the model's column name
    pub fn identifier(self) -> &'static str {
        self.spec().identifier
    }

    /// Display label in the given locale
    pub fn label(self, locale: Locale) -> &'static str {
        self.spec().labels[locale.index()]
    }

    /// Options ordered by code
    pub fn options(self) -> &'static [OptionSpec] {
        self.spec().options
    }

    fn spec(self) -> &'static FeatureSpec {
        &FEATURES[self.index()]
    }
}

/// One selectable answer for a feature
#[derive(Debug)]
pub struct OptionSpec {
    pub code: u8,
    labels: [&'static str; 2],
}

impl OptionSpec {
    const fn new(code: u8, zh: &'static str, en: &'static str) -> Self {
        Self {
            code,
            labels: [zh, en],
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        self.labels[locale.index()]
    }

    fn matches(&self, label: &str) -> bool {
        self.labels.iter().any(|l| *l == label)
    }
}

#[derive(Debug)]
struct FeatureSpec {
    id: FeatureId,
    identifier: &'static str,
    labels: [&'static str; 2],
    options: &'static [OptionSpec],
}

const NO_YES: [OptionSpec; 2] = [OptionSpec::new(0, "否", "No"), OptionSpec::new(1, "是", "Yes")];

static FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        id: FeatureId::Age,
        identifier: "Age",
        labels: ["年龄", "Age"],
        options: &[
            OptionSpec::new(0, "60-69岁", "60-69 years"),
            OptionSpec::new(1, "70-79岁", "70-79 years"),
            OptionSpec::new(2, "80岁及以上", "80 years and above"),
        ],
    },
    FeatureSpec {
        id: FeatureId::EducationLevel,
        identifier: "educational level",
        labels: ["文化程度", "Education level"],
        options: &[
            OptionSpec::new(0, "小学及以下", "Primary school or below"),
            OptionSpec::new(1, "初中", "Junior high school"),
            OptionSpec::new(2, "高中/中专/技校", "High school or vocational school"),
            OptionSpec::new(3, "大专及以上", "College or above"),
        ],
    },
    FeatureSpec {
        id: FeatureId::RegularExercise,
        identifier: "Regular exercise",
        labels: ["规律运动", "Regular exercise"],
        options: &NO_YES,
    },
    FeatureSpec {
        id: FeatureId::Dccn,
        identifier: "DCCN",
        labels: ["糖尿病慢性并发症数量", "Number of chronic diabetic complications"],
        options: &[
            OptionSpec::new(0, "<2个", "Fewer than 2"),
            OptionSpec::new(1, "≥2个", "2 or more"),
        ],
    },
    FeatureSpec {
        id: FeatureId::Malnutrition,
        identifier: "Malnutrition",
        labels: ["营养不良", "Malnutrition"],
        options: &NO_YES,
    },
    FeatureSpec {
        id: FeatureId::Depressive,
        identifier: "Depressive",
        labels: ["抑郁", "Depression"],
        options: &NO_YES,
    },
];

/// Model input: one code per feature, indexed by [`FeatureId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureVector([u8; FEATURE_COUNT]);

impl FeatureVector {
    /// Build a vector from raw codes, rejecting any code outside its feature's range
    pub fn from_codes(codes: [u8; FEATURE_COUNT]) -> Option<Self> {
        let in_range = FeatureId::ALL
            .iter()
            .all(|id| (codes[id.index()] as usize) < id.options().len());
        in_range.then_some(Self(codes))
    }

    pub fn get(&self, feature: FeatureId) -> u8 {
        self.0[feature.index()]
    }

    pub fn codes(&self) -> &[u8; FEATURE_COUNT] {
        &self.0
    }

    /// Codes widened to the classifier's numeric input type
    pub fn to_f64(&self) -> [f64; FEATURE_COUNT] {
        self.0.map(f64::from)
    }
}

/// Option labels are matched in any locale, so a label may name at most one option
fn check_option_labels(feature: &str, options: &[OptionSpec]) -> std::result::Result<(), String> {
    let mut owners = HashMap::new();
    for option in options {
        for label in option.labels {
            match owners.insert(label, option.code) {
                Some(code) if code != option.code => {
                    return Err(format!(
                        "Feature {feature} uses option label '{label}' for codes {code} and {}",
                        option.code
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Bidirectional lookup between display labels and model codes
#[derive(Debug, Clone, Copy)]
pub struct FeatureDictionary {
    features: &'static [FeatureSpec; FEATURE_COUNT],
}

impl Default for FeatureDictionary {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeatureDictionary {
    /// The built-in six-feature dictionary
    pub fn standard() -> Self {
        Self {
            features: &FEATURES,
        }
    }

    /// Check the table for completeness and label collisions
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut feature_labels = HashSet::new();

        for (position, spec) in self.features.iter().enumerate() {
            if spec.id.index() != position {
                return Err(format!(
                    "Feature {} declared at position {}",
                    spec.identifier, position
                ));
            }

            if spec.options.is_empty() {
                return Err(format!("Feature {} has no options", spec.identifier));
            }

            for label in spec.labels {
                if !feature_labels.insert(label) {
                    return Err(format!("Feature label '{label}' is used more than once"));
                }
            }

            for (expected, option) in spec.options.iter().enumerate() {
                if option.code as usize != expected {
                    return Err(format!(
                        "Feature {} option codes are not contiguous at {}",
                        spec.identifier, option.code
                    ));
                }
            }

            check_option_labels(spec.identifier, spec.options)?;
        }

        Ok(())
    }

    /// Internal identifiers in the column order the model expects
    pub fn ordered_feature_identifiers(&self) -> [&'static str; FEATURE_COUNT] {
        FeatureId::ALL.map(FeatureId::identifier)
    }

    /// Find the feature whose display label matches in any supported locale
    pub fn resolve(&self, display_label: &str) -> Result<FeatureId> {
        self.features
            .iter()
            .find(|spec| spec.labels.iter().any(|l| *l == display_label))
            .map(|spec| spec.id)
            .ok_or_else(|| RiskError::UnknownFeature {
                label: display_label.to_string(),
            })
    }

    /// Code of `option_label` within `feature`
    pub fn option_code(&self, feature: FeatureId, option_label: &str) -> Result<u8> {
        feature
            .options()
            .iter()
            .find(|option| option.matches(option_label))
            .map(|option| option.code)
            .ok_or_else(|| RiskError::UnknownOption {
                feature: feature.identifier(),
                option: option_label.to_string(),
            })
    }

    /// Translate a submitted `(feature label, option label)` pair into a code
    pub fn encode(&self, display_label: &str, option_label: &str) -> Result<u8> {
        let feature = self.resolve(display_label)?;
        self.option_code(feature, option_label)
    }

    /// Option label for `code` in the given locale
    pub fn decode(&self, feature: FeatureId, code: u8, locale: Locale) -> Option<&'static str> {
        feature
            .options()
            .get(code as usize)
            .map(|option| option.label(locale))
    }

    /// Encode every submitted pair and lay the codes out in column order
    ///
    /// Pairs may arrive in any order. Every feature must appear exactly once.
    pub fn assemble<'a, I>(&self, pairs: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut slots: [Option<u8>; FEATURE_COUNT] = [None; FEATURE_COUNT];

        for (label, option) in pairs {
            let feature = self.resolve(label)?;
            let code = self.option_code(feature, option)?;
            let slot = &mut slots[feature.index()];
            if slot.is_some() {
                return Err(RiskError::DuplicateFeature {
                    feature: feature.identifier(),
                });
            }
            *slot = Some(code);
        }

        let mut codes = [0u8; FEATURE_COUNT];
        for feature in FeatureId::ALL {
            codes[feature.index()] =
                slots[feature.index()].ok_or(RiskError::MissingFeature {
                    feature: feature.identifier(),
                })?;
        }

        Ok(FeatureVector(codes))
    }
}
