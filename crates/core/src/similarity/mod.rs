//! Product similarity scoring and alternative discovery.
//!
//! The scorer compares two catalog entries across five independent signals
//! (embedding cosine, structured specifications, grade, specification text,
//! name tokens). A signal contributes only once it clears its own threshold;
//! weights of signals that cannot be computed are not redistributed.

mod alternatives;
mod scoring;
mod types;

pub use alternatives::AlternativeFinder;
pub use scoring::{specification_overlap, SimilarityScorer};
pub use types::*;

/// Default signal weights
pub const DEFAULT_WEIGHTS: SimilarityWeights = SimilarityWeights {
    semantic: 0.40,
    specification: 0.30,
    grade: 0.15,
    specification_text: 0.10,
    name: 0.10,
};

/// Default per-signal activation thresholds and the alternative cut-off
pub const DEFAULT_THRESHOLDS: SimilarityThresholds = SimilarityThresholds {
    semantic: 0.70,
    specification: 0.30,
    specification_text: 0.50,
    name: 0.30,
    minimum_score: 0.20,
};

/// Recency-ordered sample of same-category products considered per lookup
pub const DEFAULT_CANDIDATE_POOL: usize = 50;

/// Alternatives returned when the caller does not ask for a specific count
pub const DEFAULT_ALTERNATIVE_LIMIT: usize = 3;

/// Tokens shorter than this are ignored by the text and name signals
pub const MIN_TOKEN_CHARS: usize = 3;
