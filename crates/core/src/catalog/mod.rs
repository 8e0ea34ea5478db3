//! Immutable, in-memory view of the catalog reference data.
//!
//! A snapshot is loaded once per process (or per request) from the catalog
//! store and then served to the engine through the lookup ports.

pub mod trigram;

use std::collections::HashMap;

use crate::domain::offer::VendorOffer;
use crate::domain::product::{CatalogProduct, Embedding, ProductId};
use crate::ports::{
    CatalogLookup, CatalogNumberMatch, EmbeddingLookup, LookupError, VendorOfferLookup,
};
use crate::text::contains_ignore_case;

pub use trigram::{trigram_similarity, TrigramNameIndex, UnavailableFuzzyIndex};

#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    products: Vec<CatalogProduct>,
    positions: HashMap<ProductId, usize>,
    offers: HashMap<ProductId, Vec<VendorOffer>>,
}

impl CatalogSnapshot {
    /// Products keep the given listing order; offers keep their order per product.
    /// A repeated product id replaces the earlier entry in place.
    pub fn new(products: Vec<CatalogProduct>, offers: Vec<VendorOffer>) -> Self {
        let mut snapshot = Self::default();
        for product in products {
            match snapshot.positions.get(&product.id) {
                Some(&position) => snapshot.products[position] = product,
                None => {
                    snapshot.positions.insert(product.id.clone(), snapshot.products.len());
                    snapshot.products.push(product);
                }
            }
        }
        for offer in offers {
            snapshot.offers.entry(offer.product_id.clone()).or_default().push(offer);
        }
        snapshot
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&CatalogProduct> {
        self.positions.get(product_id).map(|&position| &self.products[position])
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn offer_count(&self) -> usize {
        self.offers.values().map(Vec::len).sum()
    }

    pub fn embedding_count(&self) -> usize {
        self.products.iter().filter(|product| product.embedding.is_some()).count()
    }

    /// A product is in scope for a vendor hint when its brand equals the hint
    /// or one of its offers comes from that vendor.
    pub fn in_vendor_scope(&self, product: &CatalogProduct, vendor_hint: &str) -> bool {
        let hint = vendor_hint.trim();
        if hint.is_empty() {
            return true;
        }

        let brand_matches =
            product.brand.as_deref().is_some_and(|brand| brand.trim().eq_ignore_ascii_case(hint));
        brand_matches
            || self
                .offers
                .get(&product.id)
                .is_some_and(|offers| offers.iter().any(|offer| offer.matches_vendor_hint(hint)))
    }

    fn scoped<'a>(
        &'a self,
        vendor_hint: Option<&'a str>,
    ) -> impl Iterator<Item = &'a CatalogProduct> + 'a {
        self.products.iter().filter(move |product| {
            vendor_hint.map_or(true, |hint| self.in_vendor_scope(product, hint))
        })
    }
}

impl CatalogLookup for CatalogSnapshot {
    fn product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, LookupError> {
        Ok(self.find(id).cloned())
    }

    fn by_catalog_number(
        &self,
        catalog_number: &str,
        mode: CatalogNumberMatch,
        vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        let wanted = catalog_number.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .scoped(vendor_hint)
            .filter(|product| {
                product.catalog_number.as_deref().is_some_and(|number| {
                    let number = number.trim().to_lowercase();
                    match mode {
                        CatalogNumberMatch::Exact => number == wanted,
                        CatalogNumberMatch::Prefix => number.starts_with(&wanted),
                    }
                })
            })
            .cloned()
            .collect())
    }

    fn by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        let category = category.trim();
        let mut matching = self
            .products
            .iter()
            .filter(|product| {
                product
                    .category
                    .as_deref()
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case(category))
            })
            .collect::<Vec<_>>();

        // Stable sort: equal timestamps keep listing order.
        matching.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        Ok(matching.into_iter().take(limit).cloned().collect())
    }

    fn by_name_containing(
        &self,
        needle: &str,
        vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .scoped(vendor_hint)
            .filter(|product| product.searchable_names().any(|name| contains_ignore_case(name, needle)))
            .cloned()
            .collect())
    }
}

impl VendorOfferLookup for CatalogSnapshot {
    fn offers_for(&self, product_id: &ProductId) -> Result<Vec<VendorOffer>, LookupError> {
        Ok(self.offers.get(product_id).cloned().unwrap_or_default())
    }
}

impl EmbeddingLookup for CatalogSnapshot {
    fn embedding_for(&self, product_id: &ProductId) -> Result<Option<Embedding>, LookupError> {
        Ok(self.find(product_id).and_then(|product| product.embedding.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::CatalogSnapshot;
    use crate::domain::offer::VendorOffer;
    use crate::domain::product::{CatalogProduct, ProductId};
    use crate::ports::{CatalogLookup, CatalogNumberMatch, VendorOfferLookup};

    fn fixture() -> CatalogSnapshot {
        let day = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).single().expect("valid date");
        CatalogSnapshot::new(
            vec![
                CatalogProduct::new("p-1", "Pipette Tips 200uL")
                    .with_category("Consumables")
                    .with_catalog_number("TIP-200")
                    .with_brand("Eppendorf")
                    .with_updated_at(day(1)),
                CatalogProduct::new("p-2", "Pipette Tips 1000uL")
                    .with_category("consumables")
                    .with_catalog_number("TIP-200-F")
                    .with_updated_at(day(5)),
                CatalogProduct::new("p-3", "Ethanol absolute")
                    .with_category("Chemicals")
                    .with_alternate_name("Ethyl alcohol")
                    .with_catalog_number("E7023")
                    .with_updated_at(day(3)),
            ],
            vec![
                VendorOffer::new("p-2", "v-fisher", Decimal::new(42_000, 0), Some(4))
                    .with_vendor_name("Fisher Scientific"),
                VendorOffer::new("p-2", "v-vwr", Decimal::new(39_000, 0), Some(9)),
            ],
        )
    }

    #[test]
    fn catalog_number_lookup_is_case_insensitive() {
        let snapshot = fixture();

        let exact =
            snapshot.by_catalog_number("tip-200", CatalogNumberMatch::Exact, None).expect("lookup");
        assert_eq!(exact.iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>(), vec!["p-1"]);

        let prefix =
            snapshot.by_catalog_number("TIP", CatalogNumberMatch::Prefix, None).expect("lookup");
        assert_eq!(prefix.len(), 2);
    }

    #[test]
    fn vendor_scope_uses_brand_or_offering_vendor() {
        let snapshot = fixture();

        let by_brand = snapshot
            .by_catalog_number("TIP", CatalogNumberMatch::Prefix, Some("eppendorf"))
            .expect("lookup");
        assert_eq!(by_brand.iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>(), vec!["p-1"]);

        let by_vendor = snapshot
            .by_catalog_number("TIP", CatalogNumberMatch::Prefix, Some("Fisher Scientific"))
            .expect("lookup");
        assert_eq!(by_vendor.iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>(), vec!["p-2"]);
    }

    #[test]
    fn category_lookup_orders_by_recency_and_limits() {
        let snapshot = fixture();

        let products = snapshot.by_category("CONSUMABLES", 10).expect("lookup");
        assert_eq!(products.iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>(), vec!["p-2", "p-1"]);

        let limited = snapshot.by_category("consumables", 1).expect("lookup");
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn name_containment_checks_alternate_names() {
        let snapshot = fixture();

        let found = snapshot.by_name_containing("ETHYL", None).expect("lookup");
        assert_eq!(found.iter().map(|p| p.id.0.as_str()).collect::<Vec<_>>(), vec!["p-3"]);
        assert!(snapshot.by_name_containing("  ", None).expect("lookup").is_empty());
    }

    #[test]
    fn offers_keep_listing_order() {
        let snapshot = fixture();

        let offers = snapshot.offers_for(&ProductId::from("p-2")).expect("lookup");
        assert_eq!(
            offers.iter().map(|o| o.vendor_id.0.as_str()).collect::<Vec<_>>(),
            vec!["v-fisher", "v-vwr"]
        );
        assert!(snapshot.offers_for(&ProductId::from("p-1")).expect("lookup").is_empty());
        assert_eq!(snapshot.offer_count(), 2);
    }

    #[test]
    fn repeated_product_ids_replace_in_place() {
        let snapshot = CatalogSnapshot::new(
            vec![
                CatalogProduct::new("p-1", "Old name"),
                CatalogProduct::new("p-2", "Other"),
                CatalogProduct::new("p-1", "New name"),
            ],
            Vec::new(),
        );

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.products()[0].name, "New name");
    }
}
