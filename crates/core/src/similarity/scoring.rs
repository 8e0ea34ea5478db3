//! Pairwise similarity between two catalog entries

use std::collections::BTreeMap;

use super::types::*;
use super::MIN_TOKEN_CHARS;
use crate::domain::product::CatalogProduct;
use crate::text::{compact_lowercase, jaccard, round_to_hundredths, token_set};

/// Score calculator for catalog alternatives
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
    thresholds: SimilarityThresholds,
}

impl SimilarityScorer {
    /// Create a scorer with default weights and thresholds
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_thresholds(mut self, thresholds: SimilarityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    pub fn thresholds(&self) -> &SimilarityThresholds {
        &self.thresholds
    }

    /// Aggregate similarity of `candidate` to `reference`.
    ///
    /// Not symmetric in its reasons: the name tag is only emitted when no
    /// stronger signal fired, though the name contribution always counts.
    pub fn score(&self, reference: &CatalogProduct, candidate: &CatalogProduct) -> SimilarityScore {
        let signals = SignalScores {
            semantic: match (&reference.embedding, &candidate.embedding) {
                (Some(left), Some(right)) => left.cosine(right),
                _ => None,
            },
            specification: specification_overlap(
                &reference.specifications,
                &candidate.specifications,
            ),
            grade_match: grades_match(reference, candidate),
            specification_text: specification_text_overlap(reference, candidate),
            name: jaccard(
                &token_set(&reference.name, MIN_TOKEN_CHARS),
                &token_set(&candidate.name, MIN_TOKEN_CHARS),
            ),
        };

        let mut total = 0.0;
        let mut reasons = Vec::new();

        if let Some(cosine) = signals.semantic {
            if cosine > self.thresholds.semantic {
                total += self.weights.semantic * cosine.clamp(0.0, 1.0);
                reasons.push(SimilarityReason::SemanticMatch);
            }
        }

        if signals.specification > self.thresholds.specification {
            total += self.weights.specification * signals.specification.clamp(0.0, 1.0);
            reasons.push(SimilarityReason::SpecificationOverlap);
        }

        if signals.grade_match {
            total += self.weights.grade;
            reasons.push(SimilarityReason::SameGrade);
        }

        if signals.specification_text > self.thresholds.specification_text {
            total += self.weights.specification_text * signals.specification_text.clamp(0.0, 1.0);
            reasons.push(SimilarityReason::SpecificationText);
        }

        if signals.name > self.thresholds.name {
            total += self.weights.name * signals.name.clamp(0.0, 1.0);
            if reasons.is_empty() {
                reasons.push(SimilarityReason::NameOverlap);
            }
        }

        if reasons.is_empty() && reference.shares_category_with(candidate) {
            reasons.push(SimilarityReason::SameCategory);
        }

        SimilarityScore { score: round_to_hundredths(total.clamp(0.0, 1.0)), reasons, signals }
    }
}

/// Points per shared key (2 for an equal value, 1 when one value contains the
/// other) normalised by twice the larger key count. Every declared key counts
/// toward the denominator, including blank-valued and case-variant keys.
pub fn specification_overlap(
    left: &BTreeMap<String, String>,
    right: &BTreeMap<String, String>,
) -> f64 {
    let key_count = left.len().max(right.len());
    if key_count == 0 {
        return 0.0;
    }
    let left = normalized_specifications(left);
    let right = normalized_specifications(right);

    let points: u32 = left
        .iter()
        .filter_map(|(key, value)| right.get(key).map(|other| (value, other)))
        .map(|(value, other)| {
            if value == other {
                2
            } else if value.contains(other.as_str()) || other.contains(value.as_str()) {
                1
            } else {
                0
            }
        })
        .sum();

    f64::from(points) / (2.0 * key_count as f64)
}

/// Keys are matched trimmed and case-insensitively; blank values are ignored.
fn normalized_specifications(specifications: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    specifications
        .iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            let value = compact_lowercase(value);
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

fn grades_match(reference: &CatalogProduct, candidate: &CatalogProduct) -> bool {
    match (reference.grade.as_deref(), candidate.grade.as_deref()) {
        (Some(left), Some(right)) => !left.trim().is_empty() && left.trim() == right.trim(),
        _ => false,
    }
}

fn specification_text_overlap(reference: &CatalogProduct, candidate: &CatalogProduct) -> f64 {
    let text = |product: &CatalogProduct| {
        token_set(
            &product.specifications.values().map(String::as_str).collect::<Vec<_>>().join(" "),
            MIN_TOKEN_CHARS,
        )
    };
    jaccard(&text(reference), &text(candidate))
}
