use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::DataError;

/// One merit-list row: a seat category for an institute, branch, quota and gender.
///
/// Deserializes from headers already mapped through [`canonical_header`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRow {
    #[serde(rename(deserialize = "Institute"))]
    pub institute: String,
    #[serde(rename(deserialize = "Branch"))]
    pub branch: String,
    #[serde(rename(deserialize = "Quota"), default)]
    pub quota: String,
    #[serde(rename(deserialize = "SeatCategory"))]
    pub seat_category: String,
    #[serde(rename(deserialize = "Gender"), default)]
    pub gender: String,
    #[serde(
        rename(deserialize = "OpeningRank"),
        default,
        deserialize_with = "lenient_rank"
    )]
    pub opening_rank: Option<u32>,
    #[serde(
        rename(deserialize = "ClosingRank"),
        default,
        deserialize_with = "lenient_rank"
    )]
    pub closing_rank: Option<u32>,
}

const REQUIRED_COLUMNS: [&str; 4] = ["Institute", "Branch", "SeatCategory", "ClosingRank"];

/// Maps a seat-table header to its canonical name, ignoring case, spaces,
/// underscores and hyphens.
pub fn canonical_header(header: &str) -> Option<&'static str> {
    let key: String = header
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_' && *ch != '-')
        .flat_map(char::to_lowercase)
        .collect();
    let canonical = match key.as_str() {
        "institute" | "institutename" | "institution" => "Institute",
        "branch" | "program" | "programname" | "academicprogramname" => "Branch",
        "quota" => "Quota",
        "seatcategory" | "seattype" | "category" => "SeatCategory",
        "gender" => "Gender",
        "openingrank" => "OpeningRank",
        "closingrank" => "ClosingRank",
        _ => return None,
    };
    Some(canonical)
}

/// Caller-validated query. `None` and empty sets mean "no filter" on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankQuery {
    pub category: String,
    pub rank: u32,
    #[serde(default)]
    pub quota: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub institutes: Vec<String>,
}

impl RankQuery {
    pub fn new(category: impl Into<String>, rank: u32) -> Self {
        Self {
            category: category.into(),
            rank,
            ..Self::default()
        }
    }

    pub fn with_quota(mut self, quota: impl Into<String>) -> Self {
        self.quota = Some(quota.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches = branches;
        self
    }

    pub fn with_institutes(mut self, institutes: Vec<String>) -> Self {
        self.institutes = institutes;
        self
    }

    /// Rows without a closing rank never match.
    pub fn matches(&self, row: &SeatRow) -> bool {
        let eligible = row
            .closing_rank
            .map(|closing| closing >= self.rank)
            .unwrap_or(false);

        eligible
            && row.seat_category == self.category
            && self.quota.as_ref().map_or(true, |quota| *quota == row.quota)
            && self.gender.as_ref().map_or(true, |gender| *gender == row.gender)
            && (self.branches.is_empty() || self.branches.contains(&row.branch))
            && (self.institutes.is_empty() || self.institutes.contains(&row.institute))
    }
}

/// Matching rows, ordered by closing rank ascending.
pub fn filter(rows: &[SeatRow], query: &RankQuery) -> Vec<SeatRow> {
    let mut matched: Vec<SeatRow> = rows.iter().filter(|row| query.matches(row)).cloned().collect();
    matched.sort_by_key(|row| row.closing_rank);
    debug!(
        category = %query.category,
        rank = query.rank,
        matched = matched.len(),
        "filtered seat rows"
    );
    matched
}

#[derive(Debug, Clone, Default)]
pub struct SeatTable {
    rows: Vec<SeatRow>,
}

impl SeatTable {
    pub fn from_rows(rows: Vec<SeatRow>) -> Self {
        Self { rows }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: csv::StringRecord = csv_reader
            .headers()?
            .iter()
            .map(|header| canonical_header(header).unwrap_or(header).to_string())
            .collect();
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|header| header == **column))
        {
            return Err(DataError::MissingColumn(*missing));
        }
        csv_reader.set_headers(headers);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<SeatRow>() {
            rows.push(record?);
        }

        info!(seats = rows.len(), "loaded seat table");
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[SeatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filter(&self, query: &RankQuery) -> Vec<SeatRow> {
        filter(&self.rows, query)
    }

    pub fn categories(&self) -> Vec<String> {
        self.distinct(|row| &row.seat_category)
    }

    pub fn quotas(&self) -> Vec<String> {
        self.distinct(|row| &row.quota)
    }

    pub fn genders(&self) -> Vec<String> {
        self.distinct(|row| &row.gender)
    }

    pub fn branches(&self) -> Vec<String> {
        self.distinct(|row| &row.branch)
    }

    pub fn institutes(&self) -> Vec<String> {
        self.distinct(|row| &row.institute)
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&SeatRow) -> &String,
    {
        self.rows
            .iter()
            .map(field)
            .filter(|value| !value.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Non-numeric rank cells (blank, "NA", preparatory "123P") read as missing.
fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|value| parse_rank_cell(&value)))
}

fn parse_rank_cell(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if let Ok(rank) = trimmed.parse::<u32>() {
        return Some(rank);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|rank| rank.is_finite() && *rank >= 0.0 && rank.fract() == 0.0)
        .map(|rank| rank as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_map_case_insensitively() {
        assert_eq!(canonical_header("CLOSING RANK"), Some("ClosingRank"));
        assert_eq!(canonical_header("seat type"), Some("SeatCategory"));
        assert_eq!(canonical_header("closing_rank"), Some("ClosingRank"));
        assert_eq!(canonical_header("Academic Program Name"), Some("Branch"));
        assert_eq!(canonical_header("Round"), None);
    }

    #[test]
    fn rank_cells_parse_leniently() {
        assert_eq!(parse_rank_cell("1024"), Some(1024));
        assert_eq!(parse_rank_cell("1024.0"), Some(1024));
        assert_eq!(parse_rank_cell("123P"), None);
        assert_eq!(parse_rank_cell(""), None);
    }
}
