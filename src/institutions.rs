use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::criteria::{CriterionMap, CriterionName};
use crate::error::DataError;

/// Static reference data for one institution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionRow {
    pub name: String,
    pub country: String,
    pub global_rank: Option<u32>,
    pub required_score: Option<f64>,
    pub weights: CriterionMap,
}

impl InstitutionRow {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            global_rank: None,
            required_score: None,
            weights: CriterionMap::new(),
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.global_rank = Some(rank);
        self
    }

    pub fn with_required_score(mut self, score: f64) -> Self {
        self.required_score = Some(score);
        self
    }

    /// Negative or non-finite weights are dropped, which scores the criterion as weight 0.
    pub fn with_weight(mut self, criterion: CriterionName, weight: f64) -> Self {
        if weight.is_finite() && weight >= 0.0 {
            self.weights.insert(criterion, weight);
        }
        self
    }

    pub fn weight(&self, criterion: CriterionName) -> f64 {
        self.weights.get(&criterion).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryWeights {
    pub country: String,
    pub weights: CriterionMap,
}

#[derive(Debug, Clone, Default)]
pub struct InstitutionTable {
    rows: Vec<InstitutionRow>,
    country_weights: Vec<CountryWeights>,
}

impl InstitutionTable {
    pub fn from_rows(rows: Vec<InstitutionRow>) -> Self {
        Self {
            rows,
            country_weights: Vec::new(),
        }
    }

    /// Loads a table where every row carries its own criterion weights.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv_reader(reader);
        let columns = read_columns(&mut csv_reader)?;
        require(&columns, Column::Name, "Name")?;

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            if let Some(row) = parse_institution(&columns, &record, line + 2) {
                rows.push(row);
            }
        }

        info!(institutions = rows.len(), "loaded institution table");
        Ok(Self::from_rows(rows))
    }

    /// Loads the spreadsheet layout: a per-country weights table left-joined onto a
    /// universities table by country.
    pub fn from_split_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        country_weights: P,
        universities: Q,
    ) -> Result<Self, DataError> {
        let weights = std::fs::File::open(country_weights)?;
        let universities = std::fs::File::open(universities)?;
        Self::from_split_readers(weights, universities)
    }

    pub fn from_split_readers<W: Read, U: Read>(
        country_weights: W,
        universities: U,
    ) -> Result<Self, DataError> {
        let country_weights = parse_country_weights(country_weights)?;
        let lookup: HashMap<&str, &CriterionMap> = country_weights
            .iter()
            .map(|entry| (entry.country.as_str(), &entry.weights))
            .collect();

        let mut csv_reader = csv_reader(universities);
        let columns = read_columns(&mut csv_reader)?;
        require(&columns, Column::Name, "Name")?;
        require(&columns, Column::Country, "Country")?;

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let Some(mut row) = parse_institution(&columns, &record, line + 2) else {
                continue;
            };
            match lookup.get(row.country.as_str()) {
                Some(weights) => {
                    let own = std::mem::take(&mut row.weights);
                    row.weights = (*weights).clone();
                    row.weights.extend(own);
                }
                None => debug!(
                    institution = %row.name,
                    country = %row.country,
                    "no weights row for country"
                ),
            }
            rows.push(row);
        }

        info!(
            institutions = rows.len(),
            countries = country_weights.len(),
            "loaded institution table from country weights"
        );
        Ok(Self {
            rows,
            country_weights,
        })
    }

    pub fn rows(&self) -> &[InstitutionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn country_weights(&self) -> &[CountryWeights] {
        &self.country_weights
    }

    /// Distinct countries in first-seen order.
    pub fn countries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.country_weights
            .iter()
            .map(|entry| entry.country.as_str())
            .chain(self.rows.iter().map(|row| row.country.as_str()))
            .filter(|country| !country.is_empty() && seen.insert(*country))
            .map(str::to_string)
            .collect()
    }

    /// Rows whose country is in `countries`; an empty slice selects every row.
    pub fn select<'a>(&'a self, countries: &[String]) -> Vec<&'a InstitutionRow> {
        self.rows
            .iter()
            .filter(|row| countries.is_empty() || countries.iter().any(|c| *c == row.country))
            .collect()
    }

    /// Catalogue view ordered by global rank, unranked institutions last.
    pub fn by_global_rank<'a>(&'a self, countries: &[String]) -> Vec<&'a InstitutionRow> {
        let mut rows = self.select(countries);
        rows.sort_by(|a, b| compare_rank(a.global_rank, b.global_rank));
        rows
    }
}

/// Ascending rank order with missing ranks after every present one.
pub fn compare_rank(a: Option<u32>, b: Option<u32>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Country,
    GlobalRank,
    RequiredScore,
    Total,
    Criterion(CriterionName),
}

impl Column {
    fn from_header(header: &str) -> Result<Self, DataError> {
        let column = match header.trim().to_lowercase().as_str() {
            "name" | "university" | "institute" | "institution" | "college" => Column::Name,
            "country" => Column::Country,
            "globalrank" | "global rank" | "rank" | "qs world rank" | "qs rank" => {
                Column::GlobalRank
            }
            "requiredscore" | "required score" | "required profile score" | "required" => {
                Column::RequiredScore
            }
            "total" => Column::Total,
            _ => match CriterionName::parse(header) {
                Some(criterion) => Column::Criterion(criterion),
                None => return Err(DataError::UnknownColumn(header.to_string())),
            },
        };
        Ok(column)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn read_columns<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Column>, DataError> {
    reader.headers()?.iter().map(Column::from_header).collect()
}

fn require(columns: &[Column], column: Column, label: &'static str) -> Result<(), DataError> {
    if columns.contains(&column) {
        Ok(())
    } else {
        Err(DataError::MissingColumn(label))
    }
}

fn parse_institution(
    columns: &[Column],
    record: &csv::StringRecord,
    line: usize,
) -> Option<InstitutionRow> {
    let mut row = InstitutionRow::new("", "");

    for (column, cell) in columns.iter().zip(record.iter()) {
        match column {
            Column::Name => row.name = cell.to_string(),
            Column::Country => row.country = cell.to_string(),
            Column::GlobalRank => row.global_rank = parse_rank(cell),
            Column::RequiredScore => row.required_score = parse_score(cell),
            Column::Total => {}
            Column::Criterion(criterion) => {
                if let Some(weight) = parse_weight(cell, *criterion, line) {
                    row.weights.insert(*criterion, weight);
                }
            }
        }
    }

    if row.name.is_empty() {
        debug!(line, "skipping row without institution name");
        return None;
    }
    Some(row)
}

fn parse_country_weights<R: Read>(reader: R) -> Result<Vec<CountryWeights>, DataError> {
    let mut csv_reader = csv_reader(reader);
    let columns = read_columns(&mut csv_reader)?;
    require(&columns, Column::Country, "Country")?;
    if let Some(column) = columns
        .iter()
        .find(|column| matches!(column, Column::Name | Column::GlobalRank | Column::RequiredScore))
    {
        return Err(DataError::UnknownColumn(format!(
            "{:?} in country weights table",
            column
        )));
    }

    let mut entries = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record?;
        let mut entry = CountryWeights {
            country: String::new(),
            weights: CriterionMap::new(),
        };
        for (column, cell) in columns.iter().zip(record.iter()) {
            match column {
                Column::Country => entry.country = cell.to_string(),
                Column::Criterion(criterion) => {
                    if let Some(weight) = parse_weight(cell, *criterion, line + 2) {
                        entry.weights.insert(*criterion, weight);
                    }
                }
                _ => {}
            }
        }
        // Spreadsheet exports repeat the header row between blocks.
        if entry.country.is_empty() || entry.country.eq_ignore_ascii_case("country") {
            continue;
        }
        entries.push(entry);
    }

    Ok(entries)
}

fn parse_weight(cell: &str, criterion: CriterionName, line: usize) -> Option<f64> {
    let value = parse_number(cell)?;
    if value < 0.0 {
        warn!(line, %criterion, value, "ignoring negative weight");
        return None;
    }
    Some(value)
}

/// Empty or non-numeric cells are missing. A trailing `%` divides by 100.
fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (digits, divisor) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest.trim(), 100.0),
        None => (trimmed, 1.0),
    };
    digits
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value / divisor)
}

/// Required scores live on the 0-100 fit scale, so `85%` and `85` agree.
fn parse_score(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    let digits = trimmed.strip_suffix('%').map(str::trim).unwrap_or(trimmed);
    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_rank(cell: &str) -> Option<u32> {
    let trimmed = cell.trim().trim_start_matches('=');
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_handles_percent_and_garbage() {
        assert_eq!(parse_number("40%"), Some(0.4));
        assert_eq!(parse_number(" 0.25 "), Some(0.25));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn required_score_keeps_fit_scale() {
        assert_eq!(parse_score("85%"), Some(85.0));
        assert_eq!(parse_score(" 72.5 "), Some(72.5));
        assert_eq!(parse_score("n/a"), None);
        assert_eq!(parse_score(""), None);
    }

    #[test]
    fn parse_rank_accepts_tied_ranks() {
        assert_eq!(parse_rank("=45"), Some(45));
        assert_eq!(parse_rank("501-510"), None);
    }

    #[test]
    fn negative_weights_are_treated_as_missing() {
        assert_eq!(parse_weight("-0.2", CriterionName::Essay, 2), None);
        assert_eq!(parse_weight("0.2", CriterionName::Essay, 2), Some(0.2));
    }
}
