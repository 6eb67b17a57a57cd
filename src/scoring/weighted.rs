use crate::institutions::InstitutionRow;
use crate::profile::StudentProfile;

/// Weighted average of profile scores over the criteria an institution actually weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    pub fn new() -> Self {
        Self
    }

    /// Fit percentage in [0, 100], rounded to two decimals. Criteria with a zero or
    /// missing weight are excluded from both the numerator and the denominator.
    pub fn score(&self, profile: &StudentProfile, row: &InstitutionRow) -> f64 {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (criterion, value) in profile.iter() {
            let weight = row.weight(criterion);
            if weight > 0.0 && weight.is_finite() {
                weighted_sum += value * weight;
                total_weight += weight;
            }
        }

        if total_weight <= 0.0 {
            return 0.0;
        }

        let fit = (weighted_sum / total_weight).clamp(0.0, 1.0);
        round_to(fit * 100.0, 2)
    }
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
