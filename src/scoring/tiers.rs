use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::institutions::compare_rank;
use crate::scoring::FitResult;

pub const DEFAULT_WINDOW_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Ambitious,
    Target,
    Safe,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Ambitious, Tier::Target, Tier::Safe];

    pub fn label(self) -> &'static str {
        match self {
            Tier::Ambitious => "Ambitious",
            Tier::Target => "Target",
            Tier::Safe => "Safe",
        }
    }
}

/// Ordering the bands are cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
    /// Consecutive windows over the fit-descending sequence.
    FitDescending,
    /// Windows around the institution the student most narrowly meets.
    GapBoundary,
    /// Consecutive windows over the gap ordering, hardest first.
    GapOrdered,
}

impl TierMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "fit" | "fit_descending" => Some(TierMode::FitDescending),
            "gap" | "boundary" | "gap_boundary" => Some(TierMode::GapBoundary),
            "gap_ordered" | "ordered" => Some(TierMode::GapOrdered),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TierMode::FitDescending => "fit_descending",
            TierMode::GapBoundary => "gap_boundary",
            TierMode::GapOrdered => "gap_ordered",
        }
    }
}

impl fmt::Display for TierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TierMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TierMode::parse(value).ok_or_else(|| format!("invalid tier mode: {}", value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierBands {
    pub ambitious: Vec<FitResult>,
    pub target: Vec<FitResult>,
    pub safe: Vec<FitResult>,
    /// Institution the target band starts at, in boundary mode.
    pub boundary: Option<FitResult>,
}

impl TierBands {
    pub fn band(&self, tier: Tier) -> &[FitResult] {
        match tier {
            Tier::Ambitious => &self.ambitious,
            Tier::Target => &self.target,
            Tier::Safe => &self.safe,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[FitResult])> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.band(tier)))
    }

    pub fn total(&self) -> usize {
        self.ambitious.len() + self.target.len() + self.safe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TierClassifier {
    mode: TierMode,
    window_size: usize,
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::new(TierMode::GapBoundary, DEFAULT_WINDOW_SIZE)
    }
}

impl TierClassifier {
    pub fn new(mode: TierMode, window_size: usize) -> Self {
        Self { mode, window_size }
    }

    pub fn mode(&self) -> TierMode {
        self.mode
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Partitions fit-sorted results into three disjoint bands. Short inputs yield
    /// partial or empty bands.
    pub fn classify(&self, results: &[FitResult]) -> TierBands {
        match self.mode {
            TierMode::FitDescending => {
                cut(results, sequential_windows(results.len(), self.window_size), None)
            }
            TierMode::GapOrdered => {
                let ordered = order_by_gap(results);
                cut(&ordered, sequential_windows(ordered.len(), self.window_size), None)
            }
            TierMode::GapBoundary => {
                let ordered = order_by_gap(results);
                match find_boundary(&ordered) {
                    Some(boundary) => cut(
                        &ordered,
                        boundary_windows(ordered.len(), boundary, self.window_size),
                        Some(boundary),
                    ),
                    None => TierBands::default(),
                }
            }
        }
    }
}

/// Results that carry a gap, hardest first: gap descending, ties by global rank.
/// Results without a required score cannot be placed and are left out.
pub fn order_by_gap(results: &[FitResult]) -> Vec<FitResult> {
    let mut ordered: Vec<FitResult> = results
        .iter()
        .filter(|result| result.gap.is_some())
        .cloned()
        .collect();
    ordered.sort_by(|a, b| {
        let gap_a = a.gap.unwrap_or(f64::NEG_INFINITY);
        let gap_b = b.gap.unwrap_or(f64::NEG_INFINITY);
        gap_b
            .total_cmp(&gap_a)
            .then_with(|| compare_rank(a.global_rank, b.global_rank))
    });
    ordered
}

/// Index of the smallest non-negative gap, or of the smallest absolute gap when the
/// student already exceeds every requirement. The first of equal candidates wins.
pub fn find_boundary(ordered: &[FitResult]) -> Option<usize> {
    let gaps = || {
        ordered
            .iter()
            .enumerate()
            .filter_map(|(idx, result)| result.gap.map(|gap| (idx, gap)))
    };

    gaps()
        .filter(|(_, gap)| *gap >= 0.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .or_else(|| gaps().min_by(|a, b| a.1.abs().total_cmp(&b.1.abs())))
        .map(|(idx, _)| idx)
}

pub fn sequential_windows(len: usize, window: usize) -> [Range<usize>; 3] {
    let end = |n: usize| n.saturating_mul(window).min(len);
    [0..end(1), end(1)..end(2), end(2)..end(3)]
}

/// Ambitious is the window before the boundary, target starts at it, safe follows.
pub fn boundary_windows(len: usize, boundary: usize, window: usize) -> [Range<usize>; 3] {
    let boundary = boundary.min(len);
    let target_end = boundary.saturating_add(window).min(len);
    let safe_end = target_end.saturating_add(window).min(len);
    [
        boundary.saturating_sub(window)..boundary,
        boundary..target_end,
        target_end..safe_end,
    ]
}

fn cut(ordered: &[FitResult], ranges: [Range<usize>; 3], boundary: Option<usize>) -> TierBands {
    let [ambitious, target, safe] = ranges;
    TierBands {
        ambitious: ordered[ambitious].to_vec(),
        target: ordered[target].to_vec(),
        safe: ordered[safe].to_vec(),
        boundary: boundary.and_then(|idx| ordered.get(idx).cloned()),
    }
}
