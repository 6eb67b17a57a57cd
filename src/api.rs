use admit_fit::config::TierConfig;
use admit_fit::scoring::TierClassifier;
use admit_fit::seats::{RankQuery, SeatRow};
use admit_fit::RawProfile;
use serde::{Deserialize, Serialize};

const MAX_APTITUDE_TESTS: usize = 3;
const MAX_RATING: u8 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ApiRecommendRequest {
    pub class10_percent: Option<f64>,
    pub class12_percent: Option<f64>,
    pub sat_score: Option<f64>,
    pub aptitude_scores: Option<Vec<f64>>,
    pub extracurriculars: Option<u32>,
    pub co_curriculars: Option<u32>,
    pub internships: Option<u32>,
    pub community_service: Option<bool>,
    pub research: Option<bool>,
    pub essay_rating: Option<u8>,
    pub interview_rating: Option<u8>,
    pub countries: Option<Vec<String>>,
    pub mode: Option<String>,
    pub window_size: Option<usize>,
}

impl ApiRecommendRequest {
    pub fn into_input(
        self,
        defaults: &TierConfig,
    ) -> Result<(RawProfile, Vec<String>, TierClassifier), String> {
        let mut raw = RawProfile::default();
        if let Some(value) = self.class10_percent {
            raw.class10_percent = value;
        }
        if let Some(value) = self.class12_percent {
            raw.class12_percent = value;
        }
        if let Some(value) = self.sat_score {
            raw.sat_score = value;
        }
        if let Some(scores) = self.aptitude_scores {
            raw.aptitude_scores = scores;
        }
        if let Some(value) = self.extracurriculars {
            raw.extracurriculars = value;
        }
        if let Some(value) = self.co_curriculars {
            raw.co_curriculars = value;
        }
        if let Some(value) = self.internships {
            raw.internships = value;
        }
        if let Some(value) = self.community_service {
            raw.community_service = value;
        }
        if let Some(value) = self.research {
            raw.research = value;
        }
        raw.essay_rating = self.essay_rating;
        raw.interview_rating = self.interview_rating;
        validate_raw_profile(&raw)?;

        let tiers = defaults.with_overrides(self.mode.as_deref(), self.window_size)?;
        let countries = selection(self.countries.unwrap_or_default());

        Ok((raw, countries, tiers.classifier()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiEligibilityRequest {
    pub category: Option<String>,
    pub rank: Option<i64>,
    pub quota: Option<String>,
    pub gender: Option<String>,
    pub branches: Option<Vec<String>>,
    pub institutes: Option<Vec<String>>,
}

impl ApiEligibilityRequest {
    pub fn into_query(self) -> Result<RankQuery, String> {
        let category = self
            .category
            .and_then(constraint)
            .ok_or_else(|| "category is required".to_string())?;
        let rank = validate_rank(self.rank.unwrap_or(0))?;

        let mut query = RankQuery::new(category, rank)
            .with_branches(selection(self.branches.unwrap_or_default()))
            .with_institutes(selection(self.institutes.unwrap_or_default()));
        if let Some(quota) = self.quota.and_then(constraint) {
            query = query.with_quota(quota);
        }
        if let Some(gender) = self.gender.and_then(constraint) {
            query = query.with_gender(gender);
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiEligibilityResponse {
    pub count: usize,
    pub rows: Vec<SeatRow>,
}

impl ApiEligibilityResponse {
    pub fn from_rows(rows: Vec<SeatRow>) -> Self {
        Self {
            count: rows.len(),
            rows,
        }
    }
}

/// Range checks the form performs before anything reaches the engine.
pub fn validate_raw_profile(raw: &RawProfile) -> Result<(), String> {
    check_range("class 10 percentage", raw.class10_percent, 100.0)?;
    check_range("class 12 percentage", raw.class12_percent, 100.0)?;
    check_range("SAT score", raw.sat_score, 1600.0)?;
    if raw.aptitude_scores.len() > MAX_APTITUDE_TESTS {
        return Err(format!(
            "at most {} aptitude test scores are accepted",
            MAX_APTITUDE_TESTS
        ));
    }
    for score in &raw.aptitude_scores {
        check_range("aptitude test score", *score, 100.0)?;
    }
    for (label, rating) in [
        ("essay rating", raw.essay_rating),
        ("interview rating", raw.interview_rating),
    ] {
        if let Some(rating) = rating {
            if rating == 0 || rating > MAX_RATING {
                return Err(format!("invalid {} (1-{}): {}", label, MAX_RATING, rating));
            }
        }
    }
    Ok(())
}

fn validate_rank(rank: i64) -> Result<u32, String> {
    u32::try_from(rank)
        .ok()
        .filter(|rank| *rank > 0)
        .ok_or_else(|| format!("rank must be a positive integer: {}", rank))
}

/// Treats blank and "All"/"Any" placeholders as no constraint.
fn constraint(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("all")
        || trimmed.eq_ignore_ascii_case("any")
        || trimmed.starts_with("--")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A multi-select that contains a placeholder selects everything.
pub fn selection(values: Vec<String>) -> Vec<String> {
    let mut selected = Vec::with_capacity(values.len());
    for value in values {
        match constraint(value) {
            Some(value) => selected.push(value),
            None => return Vec::new(),
        }
    }
    selected
}

fn check_range(label: &str, value: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(format!("invalid {} (0-{}): {}", label, max, value));
    }
    Ok(())
}
