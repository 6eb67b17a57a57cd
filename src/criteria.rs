use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed vocabulary shared by student profiles and institution weight rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CriterionName {
    Grades,
    Essay,
    Lor,
    Eca,
    Interview,
    Sat,
    Ap,
}

impl CriterionName {
    pub const ALL: [CriterionName; 7] = [
        CriterionName::Grades,
        CriterionName::Essay,
        CriterionName::Lor,
        CriterionName::Eca,
        CriterionName::Interview,
        CriterionName::Sat,
        CriterionName::Ap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CriterionName::Grades => "Grades",
            CriterionName::Essay => "Essay",
            CriterionName::Lor => "LOR",
            CriterionName::Eca => "ECA",
            CriterionName::Interview => "Interview",
            CriterionName::Sat => "SAT",
            CriterionName::Ap => "AP",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "grades" | "grades (academics)" | "academics" => Some(CriterionName::Grades),
            "essay" | "personal statement/essay" | "personal statement" => {
                Some(CriterionName::Essay)
            }
            "lor" | "lors" | "letters of recommendation (lors)" | "letters of recommendation" => {
                Some(CriterionName::Lor)
            }
            "eca" | "extracurricular activities" | "extracurriculars" => Some(CriterionName::Eca),
            "interview" => Some(CriterionName::Interview),
            "sat" | "sat/act" => Some(CriterionName::Sat),
            "ap" | "subject tests" => Some(CriterionName::Ap),
            _ => None,
        }
    }
}

impl fmt::Display for CriterionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CriterionName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CriterionName::parse(value).ok_or_else(|| format!("unknown criterion: {}", value))
    }
}

impl Serialize for CriterionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CriterionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-criterion values, used for both normalized profile scores and weights.
pub type CriterionMap = BTreeMap<CriterionName, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spreadsheet_headers() {
        assert_eq!(
            CriterionName::parse("Letters of Recommendation (LORs)"),
            Some(CriterionName::Lor)
        );
        assert_eq!(CriterionName::parse(" grades "), Some(CriterionName::Grades));
        assert_eq!(CriterionName::parse("Total"), None);
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for criterion in CriterionName::ALL {
            assert_eq!(CriterionName::parse(criterion.label()), Some(criterion));
        }
    }
}
