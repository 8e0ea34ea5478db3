//! Read-only collaborator interfaces the engine consumes.
//!
//! Everything behind these traits is reference data owned by other systems
//! (catalog sync, vendor feeds, the embedding store). The engine never writes
//! through them and never retries a failed call.

use thiserror::Error;

use crate::domain::offer::VendorOffer;
use crate::domain::product::{CatalogProduct, Embedding, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The source is switched off or unreachable; callers may degrade.
    #[error("{port} is unavailable: {reason}")]
    Unavailable { port: &'static str, reason: String },
    #[error("{port} lookup failed: {reason}")]
    Failed { port: &'static str, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogNumberMatch {
    Exact,
    Prefix,
}

pub trait CatalogLookup: Send + Sync {
    fn product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, LookupError>;

    /// Case-insensitive catalog-number lookup, restricted to products in
    /// scope for `vendor_hint` when one is given. Results keep listing order.
    fn by_catalog_number(
        &self,
        catalog_number: &str,
        mode: CatalogNumberMatch,
        vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError>;

    /// Products in `category`, most recently updated first, at most `limit`.
    fn by_category(&self, category: &str, limit: usize)
        -> Result<Vec<CatalogProduct>, LookupError>;

    /// Products whose name or alternate name contains `needle`, ignoring case.
    fn by_name_containing(
        &self,
        needle: &str,
        vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError>;
}

pub trait VendorOfferLookup: Send + Sync {
    /// Offers for one product in the order the vendors listed them.
    fn offers_for(&self, product_id: &ProductId) -> Result<Vec<VendorOffer>, LookupError>;
}

pub trait EmbeddingLookup: Send + Sync {
    fn embedding_for(&self, product_id: &ProductId) -> Result<Option<Embedding>, LookupError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyCandidate {
    pub product: CatalogProduct,
    pub similarity: f64,
}

pub trait FuzzyNameIndex: Send + Sync {
    /// Single best trigram match at or above `threshold`.
    fn best_match(
        &self,
        query: &str,
        vendor_hint: Option<&str>,
        threshold: f64,
    ) -> Result<Option<FuzzyCandidate>, LookupError>;
}
