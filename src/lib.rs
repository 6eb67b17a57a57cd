pub mod config;
pub mod criteria;
pub mod error;
pub mod institutions;
pub mod profile;
pub mod scoring;
pub mod seats;
pub mod telemetry;

use serde::Serialize;
use tracing::info;

use crate::institutions::InstitutionTable;
use crate::profile::StudentProfile;
use crate::scoring::{FitResult, ScoringPipeline, TierBands, TierClassifier, TierMode};

pub use crate::criteria::{CriterionMap, CriterionName};
pub use crate::error::DataError;
pub use crate::profile::{Normalizer, RawProfile};

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub profile: StudentProfile,
    pub mode: TierMode,
    pub window_size: usize,
    pub results: Vec<FitResult>,
    pub tiers: TierBands,
}

/// Scores the profile against the selected countries (all when `countries` is empty)
/// and bands the ranked results.
pub fn recommend(
    table: &InstitutionTable,
    profile: &StudentProfile,
    countries: &[String],
    classifier: &TierClassifier,
) -> Recommendation {
    let pipeline = ScoringPipeline::default();
    let results = pipeline.score(profile, table.select(countries));
    let tiers = classifier.classify(&results);

    info!(
        institutions = results.len(),
        ambitious = tiers.ambitious.len(),
        target = tiers.target.len(),
        safe = tiers.safe.len(),
        mode = classifier.mode().label(),
        "built recommendation"
    );

    Recommendation {
        profile: profile.clone(),
        mode: classifier.mode(),
        window_size: classifier.window_size(),
        results,
        tiers,
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
