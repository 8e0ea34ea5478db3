//! Catalog matcher: resolves free-text purchase rows to canonical products.
//!
//! Stages run in order and stop at the first hit:
//! 1. exact catalog number
//! 2. catalog-number prefix (shortest matching number wins)
//! 3. trigram similarity on name / alternate name
//! 4. substring containment, only when the fuzzy index is unavailable
//!
//! Lookups are read-only; callers persist any linkage they derive.

mod types;

pub use types::{MatchResult, MatchSettings, MatchTier};

use tracing::{debug, warn};

use crate::domain::product::CatalogProduct;
use crate::domain::purchase::PurchaseRecordInput;
use crate::errors::ApplicationError;
use crate::ports::{CatalogLookup, CatalogNumberMatch, FuzzyNameIndex};

pub const EXACT_CATALOG_CONFIDENCE: f64 = 1.0;
pub const PREFIX_CATALOG_CONFIDENCE: f64 = 0.8;
/// Lowest confidence a name-based match may report.
pub const MIN_FUZZY_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = MIN_FUZZY_CONFIDENCE;
pub const SUBSTRING_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Fuzzy confidence stays below the exact-catalog tier even for identical names.
pub const MAX_FUZZY_CONFIDENCE: f64 = 0.99;

pub struct CatalogMatcher<'a> {
    catalog: &'a dyn CatalogLookup,
    fuzzy_index: &'a dyn FuzzyNameIndex,
    settings: MatchSettings,
}

impl<'a> CatalogMatcher<'a> {
    pub fn new(catalog: &'a dyn CatalogLookup, fuzzy_index: &'a dyn FuzzyNameIndex) -> Self {
        Self { catalog, fuzzy_index, settings: MatchSettings::default() }
    }

    pub fn with_settings(mut self, settings: MatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn match_item(
        &self,
        item_name: &str,
        catalog_number: Option<&str>,
        vendor_hint: Option<&str>,
    ) -> Result<MatchResult, ApplicationError> {
        let mut record = PurchaseRecordInput::new(item_name);
        record.catalog_number = catalog_number.map(str::to_owned);
        record.vendor_hint = vendor_hint.map(str::to_owned);
        self.match_record(&record)
    }

    pub fn match_batch(
        &self,
        records: &[PurchaseRecordInput],
    ) -> Result<Vec<MatchResult>, ApplicationError> {
        records.iter().map(|record| self.match_record(record)).collect()
    }

    pub fn match_record(
        &self,
        record: &PurchaseRecordInput,
    ) -> Result<MatchResult, ApplicationError> {
        let item_name = record.item_name.trim();
        let catalog_number = record.normalized_catalog_number();
        let vendor_hint = record.normalized_vendor_hint();

        if item_name.is_empty() && catalog_number.is_none() {
            return Ok(MatchResult::unmatched("empty item name and no catalog number"));
        }

        if let Some(number) = catalog_number {
            if let Some(result) = self.match_exact_catalog(number, vendor_hint)? {
                return Ok(result);
            }
            if let Some(result) = self.match_prefix_catalog(number, vendor_hint)? {
                return Ok(result);
            }
        }

        if item_name.is_empty() {
            return Ok(MatchResult::unmatched("catalog number not found and item name is empty"));
        }

        let fuzzy = match self.fuzzy_index.best_match(
            item_name,
            vendor_hint,
            self.settings.fuzzy_threshold,
        ) {
            Ok(candidate) => Some(candidate),
            Err(error) => {
                warn!(
                    event_name = "engine.match.fuzzy_degraded",
                    item_name,
                    error = %error,
                    "fuzzy name index unavailable; falling back to substring containment"
                );
                None
            }
        };

        let result = match fuzzy {
            Some(Some(candidate)) => {
                let confidence = candidate.similarity.min(MAX_FUZZY_CONFIDENCE);
                MatchResult::matched(
                    &candidate.product,
                    MatchTier::FuzzyName,
                    confidence,
                    format!(
                        "item name resembles `{}` (trigram similarity {:.2})",
                        candidate.product.name, candidate.similarity
                    ),
                )
            }
            Some(None) => MatchResult::unmatched("no catalog number or sufficiently similar name"),
            None => self.match_substring(item_name, vendor_hint)?,
        };

        debug!(
            event_name = "engine.match.resolved",
            tier = result.tier.as_str(),
            confidence = result.confidence,
            "purchase record resolved"
        );
        Ok(result)
    }

    fn match_exact_catalog(
        &self,
        catalog_number: &str,
        vendor_hint: Option<&str>,
    ) -> Result<Option<MatchResult>, ApplicationError> {
        let candidates =
            self.catalog.by_catalog_number(catalog_number, CatalogNumberMatch::Exact, vendor_hint)?;

        Ok(candidates.first().map(|product| {
            MatchResult::matched(
                product,
                MatchTier::ExactCatalog,
                EXACT_CATALOG_CONFIDENCE,
                format!("catalog number `{catalog_number}` matched exactly"),
            )
        }))
    }

    fn match_prefix_catalog(
        &self,
        catalog_number: &str,
        vendor_hint: Option<&str>,
    ) -> Result<Option<MatchResult>, ApplicationError> {
        let candidates = self.catalog.by_catalog_number(
            catalog_number,
            CatalogNumberMatch::Prefix,
            vendor_hint,
        )?;

        Ok(most_specific(&candidates).map(|product| {
            MatchResult::matched(
                product,
                MatchTier::PrefixCatalog,
                PREFIX_CATALOG_CONFIDENCE,
                format!(
                    "catalog number `{catalog_number}` is a prefix of `{}`",
                    product.catalog_number.as_deref().unwrap_or_default()
                ),
            )
        }))
    }

    fn match_substring(
        &self,
        item_name: &str,
        vendor_hint: Option<&str>,
    ) -> Result<MatchResult, ApplicationError> {
        let candidates = self.catalog.by_name_containing(item_name, vendor_hint)?;

        Ok(match candidates.first() {
            Some(product) => MatchResult::matched(
                product,
                MatchTier::FuzzyName,
                self.settings.substring_confidence,
                format!("item name found within `{}` (fuzzy index unavailable)", product.name),
            ),
            None => MatchResult::unmatched("no catalog number or name containment match"),
        })
    }
}

/// Shortest trimmed catalog number wins; the earliest listing breaks ties.
fn most_specific(candidates: &[CatalogProduct]) -> Option<&CatalogProduct> {
    candidates.iter().fold(None, |best: Option<&CatalogProduct>, product| {
        let length = catalog_number_len(product);
        match best {
            Some(current) if catalog_number_len(current) <= length => Some(current),
            _ => Some(product),
        }
    })
}

fn catalog_number_len(product: &CatalogProduct) -> usize {
    product.catalog_number.as_deref().map(|number| number.trim().chars().count()).unwrap_or(0)
}

#[cfg(test)]
mod tests;
