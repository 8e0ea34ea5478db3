//! Types for constrained recommendation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::{VendorId, VendorOffer};
use crate::domain::product::{CatalogProduct, ProductId};
use crate::errors::{unit_interval, DomainError};

/// Caller constraints for one recommendation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParams {
    /// Per-offer price ceiling and bundle budget
    pub budget: Option<Decimal>,
    /// Offers quoting more days than this are rejected
    pub max_lead_time_days: Option<u32>,
    pub preferred_vendors: Vec<VendorId>,
    /// When non-empty, products outside these categories are dropped
    pub required_categories: Vec<String>,
    pub excluded_products: Vec<ProductId>,
}

impl OptimizationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, budget: Decimal) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_max_lead_time_days(mut self, days: u32) -> Self {
        self.max_lead_time_days = Some(days);
        self
    }

    pub fn with_preferred_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.preferred_vendors.push(VendorId(vendor.into()));
        self
    }

    pub fn with_required_category(mut self, category: impl Into<String>) -> Self {
        self.required_categories.push(category.into());
        self
    }

    pub fn with_excluded_product(mut self, product: impl Into<String>) -> Self {
        self.excluded_products.push(ProductId(product.into()));
        self
    }

    pub fn is_preferred(&self, offer: &VendorOffer) -> bool {
        self.preferred_vendors.iter().any(|vendor| offer.matches_vendor_hint(&vendor.0))
    }

    pub fn allows_category(&self, product: &CatalogProduct) -> bool {
        if self.required_categories.is_empty() {
            return true;
        }
        product.category.as_deref().is_some_and(|category| {
            self.required_categories
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(category.trim()))
        })
    }

    pub fn excludes(&self, product_id: &ProductId) -> bool {
        self.excluded_products.contains(product_id)
    }
}

/// Weights for the composite offer score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationWeights {
    /// Weight for price headroom (default: 0.40)
    pub price: f64,
    /// Weight for delivery speed (default: 0.30)
    pub lead_time: f64,
    /// Weight for vendor preference (default: 0.30)
    pub vendor: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSettings {
    pub weights: RecommendationWeights,
    pub reference_price: f64,
    pub reference_lead_time_days: u32,
    pub preferred_vendor_score: f64,
    pub other_vendor_score: f64,
    pub unknown_lead_time_score: f64,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            weights: RecommendationWeights::default(),
            reference_price: super::DEFAULT_REFERENCE_PRICE,
            reference_lead_time_days: super::DEFAULT_REFERENCE_LEAD_TIME_DAYS,
            preferred_vendor_score: super::PREFERRED_VENDOR_SCORE,
            other_vendor_score: super::OTHER_VENDOR_SCORE,
            unknown_lead_time_score: super::UNKNOWN_LEAD_TIME_SCORE,
        }
    }
}

impl RecommendationSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        unit_interval("recommendation.weights.price", self.weights.price)?;
        unit_interval("recommendation.weights.lead_time", self.weights.lead_time)?;
        unit_interval("recommendation.weights.vendor", self.weights.vendor)?;

        if !(self.reference_price.is_finite() && self.reference_price > 0.0) {
            return Err(DomainError::InvalidSetting {
                name: "recommendation.reference_price",
                reason: "must be a positive amount".to_owned(),
            });
        }
        if self.reference_lead_time_days == 0 {
            return Err(DomainError::InvalidSetting {
                name: "recommendation.reference_lead_time_days",
                reason: "must be at least one day".to_owned(),
            });
        }
        for (name, value) in [
            ("recommendation.preferred_vendor_score", self.preferred_vendor_score),
            ("recommendation.other_vendor_score", self.other_vendor_score),
            ("recommendation.unknown_lead_time_score", self.unknown_lead_time_score),
        ] {
            if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
                return Err(DomainError::InvalidSetting {
                    name,
                    reason: format!("{value} is outside [0, 100]"),
                });
            }
        }
        Ok(())
    }
}

/// Sub-scores are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product: CatalogProduct,
    pub offer: VendorOffer,
    pub price_score: f64,
    pub lead_time_score: f64,
    pub vendor_score: f64,
    pub composite: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotFound,
    Excluded,
    CategoryNotAllowed,
    NoOffers,
    BudgetExceeded,
    LeadTimeExceeded,
    BudgetAndLeadTimeExceeded,
}

impl DropReason {
    pub fn description(&self) -> &'static str {
        match self {
            DropReason::NotFound => "product not found",
            DropReason::Excluded => "excluded by request",
            DropReason::CategoryNotAllowed => "category not allowed",
            DropReason::NoOffers => "no vendor offers",
            DropReason::BudgetExceeded => "budget exceeded",
            DropReason::LeadTimeExceeded => "lead time exceeded",
            DropReason::BudgetAndLeadTimeExceeded => "budget and lead time exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedProduct {
    pub product_id: ProductId,
    pub reason: DropReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSelection {
    pub product_id: ProductId,
    pub offer: VendorOffer,
    pub composite: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub selections: Vec<BundleSelection>,
    pub total_price: Decimal,
    pub remaining_budget: Decimal,
    /// Mean over selections that quote a lead time; `None` when none do.
    pub mean_lead_time_days: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ranked: Vec<ScoredProduct>,
    pub dropped: Vec<DroppedProduct>,
    pub bundle: Option<RecommendationBundle>,
}
