//! Constrained purchase recommendation.
//!
//! Each candidate product keeps its single best vendor offer under the
//! caller's budget ceiling and lead-time cap. Survivors are ranked by a
//! weighted composite of price, lead time and vendor preference, and a
//! greedy bundle is assembled against the budget.

mod bundle;
mod engine;
mod types;

pub use bundle::assemble_bundle;
pub use engine::ConstrainedRecommender;
pub use types::*;

/// Default composite weights
pub const DEFAULT_WEIGHTS: RecommendationWeights =
    RecommendationWeights { price: 0.40, lead_time: 0.30, vendor: 0.30 };

/// Price scored against this when no budget is given
pub const DEFAULT_REFERENCE_PRICE: f64 = 1_000_000.0;

/// Lead time scored against this when no cap is given
pub const DEFAULT_REFERENCE_LEAD_TIME_DAYS: u32 = 30;

pub const PREFERRED_VENDOR_SCORE: f64 = 100.0;
pub const OTHER_VENDOR_SCORE: f64 = 50.0;

/// Lead-time score for offers that quote no lead time
pub const UNKNOWN_LEAD_TIME_SCORE: f64 = 50.0;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;
