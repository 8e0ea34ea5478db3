use serde::{Deserialize, Serialize};

use crate::domain::product::{CatalogProduct, ProductId};

/// How a match was derived, in descending order of trust.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    ExactCatalog,
    PrefixCatalog,
    FuzzyName,
    Unmatched,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactCatalog => "EXACT_CATALOG",
            Self::PrefixCatalog => "PREFIX_CATALOG",
            Self::FuzzyName => "FUZZY_NAME",
            Self::Unmatched => "UNMATCHED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub product_id: Option<ProductId>,
    pub tier: MatchTier,
    pub confidence: f64,
    pub reason: String,
}

impl MatchResult {
    pub fn matched(
        product: &CatalogProduct,
        tier: MatchTier,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            product_id: Some(product.id.clone()),
            tier,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    pub fn unmatched(reason: impl Into<String>) -> Self {
        Self { product_id: None, tier: MatchTier::Unmatched, confidence: 0.0, reason: reason.into() }
    }

    pub fn is_matched(&self) -> bool {
        self.product_id.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchSettings {
    /// Minimum trigram similarity for a fuzzy name match.
    pub fuzzy_threshold: f64,
    /// Confidence reported for substring-containment matches.
    pub substring_confidence: f64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: super::DEFAULT_FUZZY_THRESHOLD,
            substring_confidence: super::SUBSTRING_FALLBACK_CONFIDENCE,
        }
    }
}
