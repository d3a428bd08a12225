//! Risk tiers derived from the predicted probability

use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound (inclusive, percent) of the moderate tier
pub const MODERATE_THRESHOLD: f64 = 50.0;
/// Lower bound (inclusive, percent) of the high tier
pub const HIGH_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Classify a probability expressed in percent
    ///
    /// Each band includes its lower bound and excludes its upper bound.
    pub fn classify(percent: f64) -> Self {
        if percent < MODERATE_THRESHOLD {
            RiskTier::Low
        } else if percent < HIGH_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::High
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
        }
    }

    pub const fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::ZhCn, RiskTier::Low) => "低风险",
            (Locale::ZhCn, RiskTier::Moderate) => "中风险",
            (Locale::ZhCn, RiskTier::High) => "高风险",
            (Locale::En, RiskTier::Low) => "Low Risk",
            (Locale::En, RiskTier::Moderate) => "Moderate Risk",
            (Locale::En, RiskTier::High) => "High Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
