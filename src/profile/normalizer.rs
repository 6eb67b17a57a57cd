use serde::Serialize;
use tracing::debug;

use crate::criteria::{CriterionMap, CriterionName};
use crate::profile::rules::{RuleTable, Source};
use crate::profile::RawProfile;

/// Normalized criterion scores for one evaluation. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StudentProfile {
    scores: CriterionMap,
}

impl StudentProfile {
    pub fn get(&self, criterion: CriterionName) -> Option<f64> {
        self.scores.get(&criterion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CriterionName, f64)> + '_ {
        self.scores.iter().map(|(criterion, value)| (*criterion, *value))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(CriterionName, f64)> for StudentProfile {
    fn from_iter<I: IntoIterator<Item = (CriterionName, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: RuleTable,
}

impl Normalizer {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Applies every blend rule in order. Missing sub-components contribute 0;
    /// the blend is never renormalized over the parts that are present.
    pub fn normalize(&self, raw: &RawProfile) -> StudentProfile {
        let mut scores = CriterionMap::new();

        for rule in self.rules.rules() {
            let value = rule
                .terms
                .iter()
                .map(|term| {
                    let component = match term.source {
                        Source::Field { field, scale } => scale.apply(raw.value(field)),
                        Source::Criterion { criterion } => {
                            scores.get(&criterion).copied().unwrap_or(0.0)
                        }
                    };
                    term.coefficient * component
                })
                .sum::<f64>();

            debug!(criterion = %rule.criterion, value, "normalized criterion");
            scores.insert(rule.criterion, value);
        }

        StudentProfile { scores }
    }
}
