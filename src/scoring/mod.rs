pub mod pipeline;
pub mod tiers;
pub mod weighted;

pub use pipeline::{sort_by_fit, FitResult, ScoringPipeline};
pub use tiers::{Tier, TierBands, TierClassifier, TierMode};
pub use weighted::WeightedScorer;
