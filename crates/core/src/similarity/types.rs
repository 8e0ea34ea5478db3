//! Types for similarity scoring

use serde::{Deserialize, Serialize};

use crate::domain::offer::VendorOffer;
use crate::domain::product::CatalogProduct;
use crate::errors::{unit_interval, DomainError};

/// Weights for the similarity signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Embedding cosine (default: 0.40)
    pub semantic: f64,
    /// Structured specification overlap (default: 0.30)
    pub specification: f64,
    /// Flat bonus for identical grades (default: 0.15)
    pub grade: f64,
    /// Specification text token overlap (default: 0.10)
    pub specification_text: f64,
    /// Product name token overlap (default: 0.10)
    pub name: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl SimilarityWeights {
    pub fn validate(&self) -> Result<(), DomainError> {
        unit_interval("similarity.weights.semantic", self.semantic)?;
        unit_interval("similarity.weights.specification", self.specification)?;
        unit_interval("similarity.weights.grade", self.grade)?;
        unit_interval("similarity.weights.specification_text", self.specification_text)?;
        unit_interval("similarity.weights.name", self.name)
    }
}

/// A signal contributes only when its raw value is strictly above its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    pub semantic: f64,
    pub specification: f64,
    pub specification_text: f64,
    pub name: f64,
    /// Alternatives scoring at or below this are discarded.
    pub minimum_score: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        super::DEFAULT_THRESHOLDS
    }
}

impl SimilarityThresholds {
    pub fn validate(&self) -> Result<(), DomainError> {
        unit_interval("similarity.thresholds.semantic", self.semantic)?;
        unit_interval("similarity.thresholds.specification", self.specification)?;
        unit_interval("similarity.thresholds.specification_text", self.specification_text)?;
        unit_interval("similarity.thresholds.name", self.name)?;
        unit_interval("similarity.thresholds.minimum_score", self.minimum_score)
    }
}

/// Why two products were considered similar, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityReason {
    SemanticMatch,
    SpecificationOverlap,
    SameGrade,
    SpecificationText,
    NameOverlap,
    SameCategory,
}

impl SimilarityReason {
    pub fn label(&self) -> &'static str {
        match self {
            SimilarityReason::SemanticMatch => "semantically similar",
            SimilarityReason::SpecificationOverlap => "matching specifications",
            SimilarityReason::SameGrade => "same grade",
            SimilarityReason::SpecificationText => "similar specification text",
            SimilarityReason::NameOverlap => "similar name",
            SimilarityReason::SameCategory => "same category",
        }
    }
}

/// Raw per-signal values before thresholds and weights are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    /// `None` when either side lacks a comparable embedding.
    pub semantic: Option<f64>,
    pub specification: f64,
    pub grade_match: bool,
    pub specification_text: f64,
    pub name: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Weighted aggregate in [0, 1], rounded to two decimals.
    pub score: f64,
    pub reasons: Vec<SimilarityReason>,
    pub signals: SignalScores,
}

impl SimilarityScore {
    pub fn reason_labels(&self) -> Vec<&'static str> {
        self.reasons.iter().map(SimilarityReason::label).collect()
    }
}

/// One alternative for a reference product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub product: CatalogProduct,
    pub score: f64,
    pub reasons: Vec<SimilarityReason>,
    /// Lowest-priced known offer; earliest listing wins on equal prices.
    pub cheapest_offer: Option<VendorOffer>,
}
