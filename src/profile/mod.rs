pub mod normalizer;
pub mod rules;

use serde::{Deserialize, Serialize};

pub use normalizer::{Normalizer, StudentProfile};
pub use rules::{BlendTerm, RuleTable, Scale, ScoringRule, Source};

/// Everything the input form collects, assembled once and handed to the normalizer whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProfile {
    pub class10_percent: f64,
    pub class12_percent: f64,
    pub sat_score: f64,
    pub aptitude_scores: Vec<f64>,
    pub extracurriculars: u32,
    pub co_curriculars: u32,
    pub internships: u32,
    pub community_service: bool,
    pub research: bool,
    pub essay_rating: Option<u8>,
    pub interview_rating: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawField {
    Class10Percent,
    Class12Percent,
    SatScore,
    AptitudeAverage,
    Extracurriculars,
    CoCurriculars,
    Internships,
    CommunityService,
    Research,
    EssayRating,
    InterviewRating,
}

impl RawProfile {
    /// Raw value of a field before scaling. Absent optional inputs read as 0.
    pub fn value(&self, field: RawField) -> f64 {
        match field {
            RawField::Class10Percent => self.class10_percent,
            RawField::Class12Percent => self.class12_percent,
            RawField::SatScore => self.sat_score,
            RawField::AptitudeAverage => self.aptitude_average(),
            RawField::Extracurriculars => self.extracurriculars as f64,
            RawField::CoCurriculars => self.co_curriculars as f64,
            RawField::Internships => self.internships as f64,
            RawField::CommunityService => bool_to_f64(self.community_service),
            RawField::Research => bool_to_f64(self.research),
            RawField::EssayRating => self.essay_rating.map(f64::from).unwrap_or(0.0),
            RawField::InterviewRating => self.interview_rating.map(f64::from).unwrap_or(0.0),
        }
    }

    pub fn aptitude_average(&self) -> f64 {
        if self.aptitude_scores.is_empty() {
            return 0.0;
        }
        self.aptitude_scores.iter().sum::<f64>() / self.aptitude_scores.len() as f64
    }
}

fn bool_to_f64(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
