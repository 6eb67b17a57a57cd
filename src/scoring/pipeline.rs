use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::institutions::{compare_rank, InstitutionRow};
use crate::profile::StudentProfile;
use crate::scoring::weighted::round_to;
use crate::scoring::WeightedScorer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub name: String,
    pub country: String,
    pub global_rank: Option<u32>,
    pub required_score: Option<f64>,
    pub fit_score: f64,
    /// Required score minus fit score; positive means the student falls short.
    pub gap: Option<f64>,
}

impl FitResult {
    pub fn from_row(row: &InstitutionRow, fit_score: f64) -> Self {
        Self {
            name: row.name.clone(),
            country: row.country.clone(),
            global_rank: row.global_rank,
            required_score: row.required_score,
            fit_score,
            gap: row
                .required_score
                .map(|required| round_to(required - fit_score, 2)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoringPipeline {
    weighted_scorer: WeightedScorer,
}

impl ScoringPipeline {
    pub fn new(weighted_scorer: WeightedScorer) -> Self {
        Self { weighted_scorer }
    }

    /// Scores every row and returns results ordered by fit descending.
    pub fn score<'a, I>(&self, profile: &StudentProfile, rows: I) -> Vec<FitResult>
    where
        I: IntoIterator<Item = &'a InstitutionRow>,
    {
        let mut results: Vec<FitResult> = rows
            .into_iter()
            .map(|row| FitResult::from_row(row, self.weighted_scorer.score(profile, row)))
            .collect();

        sort_by_fit(&mut results);
        debug!(results = results.len(), "scored institutions");
        results
    }
}

/// Fit descending, ties by global rank ascending with unranked rows last. Stable.
pub fn sort_by_fit(results: &mut [FitResult]) {
    results.sort_by(|a, b| {
        b.fit_score
            .partial_cmp(&a.fit_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_rank(a.global_rank, b.global_rank))
    });
}
