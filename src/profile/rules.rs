use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::criteria::CriterionName;
use crate::profile::RawField;

const COEFFICIENT_TOLERANCE: f64 = 1e-6;

/// How a raw field is brought onto the unit scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// 0–100 value divided by 100.
    Percent,
    /// Divided by a known maximum. Ratios above 1 pass through.
    Max(f64),
    /// Count clamped to the cap before dividing by it.
    Cap(f64),
    /// Any non-zero value counts as 1.
    Flag,
}

impl Scale {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Scale::Percent => raw / 100.0,
            Scale::Max(max) => {
                if max > 0.0 {
                    raw / max
                } else {
                    0.0
                }
            }
            Scale::Cap(cap) => {
                if cap > 0.0 {
                    raw.clamp(0.0, cap) / cap
                } else {
                    0.0
                }
            }
            Scale::Flag => {
                if raw != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum Source {
    Field { field: RawField, scale: Scale },
    /// A criterion computed by an earlier rule in the same table.
    Criterion { criterion: CriterionName },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendTerm {
    pub source: Source,
    pub coefficient: f64,
}

impl BlendTerm {
    pub fn field(field: RawField, scale: Scale, coefficient: f64) -> Self {
        Self {
            source: Source::Field { field, scale },
            coefficient,
        }
    }

    pub fn criterion(criterion: CriterionName, coefficient: f64) -> Self {
        Self {
            source: Source::Criterion { criterion },
            coefficient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub criterion: CriterionName,
    pub terms: Vec<BlendTerm>,
}

/// Ordered, validated list of blend rules. Later rules may read criteria produced by earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScoringRule>", into = "Vec<ScoringRule>")]
pub struct RuleTable {
    rules: Vec<ScoringRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<ScoringRule>) -> Result<Self, String> {
        let mut seen: HashSet<CriterionName> = HashSet::new();

        for rule in &rules {
            if rule.terms.is_empty() {
                return Err(format!("rule for {} has no terms", rule.criterion));
            }

            let mut total = 0.0;
            for term in &rule.terms {
                if !term.coefficient.is_finite() || term.coefficient < 0.0 {
                    return Err(format!(
                        "rule for {} has an invalid coefficient: {}",
                        rule.criterion, term.coefficient
                    ));
                }
                if let Source::Criterion { criterion } = term.source {
                    if !seen.contains(&criterion) {
                        return Err(format!(
                            "rule for {} reads {} before it is computed",
                            rule.criterion, criterion
                        ));
                    }
                }
                total += term.coefficient;
            }

            if (total - 1.0).abs() > COEFFICIENT_TOLERANCE {
                return Err(format!(
                    "coefficients for {} sum to {}, expected 1",
                    rule.criterion, total
                ));
            }

            if !seen.insert(rule.criterion) {
                return Err(format!("duplicate rule for {}", rule.criterion));
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    pub fn criteria(&self) -> impl Iterator<Item = CriterionName> + '_ {
        self.rules.iter().map(|rule| rule.criterion)
    }

    /// Rule set of the undergraduate college dashboard.
    pub fn undergraduate() -> Self {
        use CriterionName::*;
        use RawField::*;

        let eca = BlendTerm::field(Extracurriculars, Scale::Cap(3.0), 1.0);
        let rules = vec![
            ScoringRule {
                criterion: Grades,
                terms: vec![
                    BlendTerm::field(Class10Percent, Scale::Percent, 0.325),
                    BlendTerm::field(Class12Percent, Scale::Percent, 0.325),
                    BlendTerm::field(SatScore, Scale::Max(1600.0), 0.25),
                    BlendTerm::field(AptitudeAverage, Scale::Percent, 0.10),
                ],
            },
            ScoringRule {
                criterion: Eca,
                terms: vec![eca],
            },
            ScoringRule {
                criterion: Essay,
                terms: vec![
                    BlendTerm::criterion(Eca, 0.10),
                    BlendTerm::field(CoCurriculars, Scale::Cap(3.0), 0.20),
                    BlendTerm::field(Internships, Scale::Cap(2.0), 0.25),
                    BlendTerm::field(CommunityService, Scale::Flag, 0.20),
                    BlendTerm::field(Research, Scale::Flag, 0.25),
                ],
            },
            ScoringRule {
                criterion: Lor,
                terms: vec![
                    BlendTerm::criterion(Grades, 0.5),
                    BlendTerm::criterion(Essay, 0.5),
                ],
            },
            ScoringRule {
                criterion: Interview,
                terms: vec![
                    BlendTerm::criterion(Eca, 0.2),
                    BlendTerm::field(CoCurriculars, Scale::Cap(3.0), 0.2),
                    BlendTerm::field(Internships, Scale::Cap(2.0), 0.2),
                    BlendTerm::field(CommunityService, Scale::Flag, 0.2),
                    BlendTerm::field(Research, Scale::Flag, 0.2),
                ],
            },
        ];

        Self { rules }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        RuleTable::undergraduate()
    }
}

impl TryFrom<Vec<ScoringRule>> for RuleTable {
    type Error = String;

    fn try_from(rules: Vec<ScoringRule>) -> Result<Self, Self::Error> {
        RuleTable::new(rules)
    }
}

impl From<RuleTable> for Vec<ScoringRule> {
    fn from(table: RuleTable) -> Self {
        table.rules
    }
}
