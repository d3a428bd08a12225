//! End-to-end evaluation of one submission

use crate::adapter::{ModelAdapter, PredictionSource};
use crate::errors::Result;
use crate::features::FeatureDictionary;
use crate::locale::Locale;
use crate::tier::RiskTier;
use serde::Serialize;
use tracing::debug;

/// Outcome of evaluating one set of answers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    /// Probability in percent, unrounded
    pub percent: f64,
    pub tier: RiskTier,
    pub source: PredictionSource,
}

impl Assessment {
    /// Percentage with one decimal place, e.g. `42.0%`
    pub fn formatted_probability(&self) -> String {
        format!("{:.1}%", self.percent)
    }

    pub fn tier_label(&self, locale: Locale) -> &'static str {
        self.tier.label(locale)
    }

    pub fn is_degraded(&self) -> bool {
        self.source == PredictionSource::Fallback
    }
}

/// Encode `pairs`, run the model and classify the result
///
/// The tier is taken from the unrounded percentage.
pub fn assess<'a, I>(
    dictionary: &FeatureDictionary,
    adapter: &ModelAdapter,
    pairs: I,
) -> Result<Assessment>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let vector = dictionary.assemble(pairs)?;
    debug!(codes = ?vector.codes(), "Assembled feature vector");

    let prediction = adapter.predict(&vector)?;
    let percent = prediction.percent();
    let tier = RiskTier::classify(percent);

    Ok(Assessment {
        percent,
        tier,
        source: prediction.source,
    })
}
