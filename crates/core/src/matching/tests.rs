use std::sync::Arc;

use rust_decimal::Decimal;

use super::*;
use crate::catalog::{CatalogSnapshot, TrigramNameIndex, UnavailableFuzzyIndex};
use crate::domain::offer::VendorOffer;
use crate::domain::product::{CatalogProduct, ProductId};
use crate::ports::{FuzzyCandidate, LookupError};

fn snapshot() -> Arc<CatalogSnapshot> {
    Arc::new(CatalogSnapshot::new(
        vec![
            CatalogProduct::new("p-fbs", "Gibco Fetal Bovine Serum (500 mL)")
                .with_brand("Gibco")
                .with_category("Cell Culture")
                .with_catalog_number("16000-044"),
            CatalogProduct::new("p-abc", "Reagent Kit A")
                .with_brand("Acme")
                .with_catalog_number("ABC-100"),
            CatalogProduct::new("p-abc-long", "Reagent Kit A, bulk")
                .with_brand("Acme")
                .with_catalog_number("ABC-1000-B"),
            CatalogProduct::new("p-abc-sigma", "Reagent Kit A (Sigma relabel)")
                .with_brand("Sigma")
                .with_catalog_number("abc-100"),
            CatalogProduct::new("p-pbs", "Phosphate Buffered Saline")
                .with_alternate_name("PBS pH 7.4")
                .with_catalog_number("10010-023"),
        ],
        vec![VendorOffer::new("p-pbs", "v-thermo", Decimal::new(18_000, 0), Some(2))
            .with_vendor_name("Thermo Fisher")],
    ))
}

struct FailingFuzzyIndex;

impl FuzzyNameIndex for FailingFuzzyIndex {
    fn best_match(
        &self,
        _query: &str,
        _vendor_hint: Option<&str>,
        _threshold: f64,
    ) -> Result<Option<FuzzyCandidate>, LookupError> {
        Err(LookupError::Failed { port: "fuzzy name index", reason: "statement timeout".to_owned() })
    }
}

struct FailingCatalog;

impl CatalogLookup for FailingCatalog {
    fn product(&self, _id: &ProductId) -> Result<Option<CatalogProduct>, LookupError> {
        Err(failure())
    }

    fn by_catalog_number(
        &self,
        _catalog_number: &str,
        _mode: CatalogNumberMatch,
        _vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        Err(failure())
    }

    fn by_category(
        &self,
        _category: &str,
        _limit: usize,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        Err(failure())
    }

    fn by_name_containing(
        &self,
        _needle: &str,
        _vendor_hint: Option<&str>,
    ) -> Result<Vec<CatalogProduct>, LookupError> {
        Err(failure())
    }
}

fn failure() -> LookupError {
    LookupError::Failed { port: "catalog", reason: "connection reset".to_owned() }
}

#[test]
fn every_catalog_number_matches_exactly_regardless_of_name() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    for product in snapshot.products() {
        let number = product.catalog_number.as_deref().expect("fixture has catalog numbers");
        let result = matcher.match_item("completely unrelated text", Some(number), None).expect("match");

        assert_eq!(result.tier, MatchTier::ExactCatalog, "catalog number {number}");
        assert_eq!(result.confidence, 1.0);
        assert!(result.product_id.is_some());
    }
}

#[test]
fn exact_match_ignores_case_and_honours_vendor_scope() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let unscoped = matcher.match_item("", Some("abc-100"), None).expect("match");
    assert_eq!(unscoped.product_id, Some(ProductId::from("p-abc")));

    let scoped = matcher.match_item("", Some("ABC-100"), Some("sigma")).expect("match");
    assert_eq!(scoped.tier, MatchTier::ExactCatalog);
    assert_eq!(scoped.product_id, Some(ProductId::from("p-abc-sigma")));
}

#[test]
fn prefix_match_prefers_shortest_catalog_number() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("kit", Some("abc-10"), None).expect("match");

    assert_eq!(result.tier, MatchTier::PrefixCatalog);
    assert_eq!(result.confidence, 0.8);
    assert_eq!(result.product_id, Some(ProductId::from("p-abc")));
}

#[test]
fn prefix_match_is_scoped_to_vendor_via_offers() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("", Some("10010"), Some("Thermo Fisher")).expect("match");
    assert_eq!(result.tier, MatchTier::PrefixCatalog);
    assert_eq!(result.product_id, Some(ProductId::from("p-pbs")));

    let out_of_scope = matcher.match_item("", Some("10010"), Some("Acme")).expect("match");
    assert_eq!(out_of_scope.tier, MatchTier::Unmatched);
}

#[test]
fn abbreviated_name_resolves_through_fuzzy_tier() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher
        .match_record(&PurchaseRecordInput::new("Gibco FBS 500ml"))
        .expect("match");

    assert_eq!(result.tier, MatchTier::FuzzyName);
    assert_eq!(result.product_id, Some(ProductId::from("p-fbs")));
    assert!(result.confidence > 0.3 && result.confidence < 1.0, "confidence {}", result.confidence);
}

#[test]
fn identical_name_stays_below_exact_tier_confidence() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("Phosphate Buffered Saline", None, None).expect("match");

    assert_eq!(result.tier, MatchTier::FuzzyName);
    assert_eq!(result.confidence, MAX_FUZZY_CONFIDENCE);
}

#[test]
fn unknown_catalog_number_falls_through_to_name_matching() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("PBS pH 7.4", Some("ZZZ-999"), None).expect("match");

    assert_eq!(result.tier, MatchTier::FuzzyName);
    assert_eq!(result.product_id, Some(ProductId::from("p-pbs")));
}

#[test]
fn blank_name_without_catalog_number_is_unmatched() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    for name in ["", "   ", "\t\n"] {
        let result = matcher.match_item(name, Some("  "), None).expect("match");
        assert_eq!(result, MatchResult::unmatched("empty item name and no catalog number"));
    }
}

#[test]
fn blank_name_with_unknown_catalog_number_skips_fuzzy_stage() {
    let snapshot = snapshot();
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &FailingFuzzyIndex);

    let result = matcher.match_item("  ", Some("NOPE-1"), None).expect("match");
    assert_eq!(result.tier, MatchTier::Unmatched);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn dissimilar_name_is_unmatched() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("Benchtop centrifuge", None, None).expect("match");
    assert_eq!(result.tier, MatchTier::Unmatched);
    assert_eq!(result.product_id, None);
}

#[test]
fn failing_fuzzy_index_degrades_to_substring_containment() {
    let snapshot = snapshot();
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &FailingFuzzyIndex);

    let result = matcher.match_item("bovine serum", None, None).expect("degraded match");

    assert_eq!(result.tier, MatchTier::FuzzyName);
    assert_eq!(result.confidence, SUBSTRING_FALLBACK_CONFIDENCE);
    assert_eq!(result.product_id, Some(ProductId::from("p-fbs")));
}

#[test]
fn unavailable_fuzzy_index_without_containment_is_unmatched() {
    let snapshot = snapshot();
    let index = UnavailableFuzzyIndex::new("disabled");
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);

    let result = matcher.match_item("Gibco FBS 500ml", None, None).expect("degraded match");
    assert_eq!(result.tier, MatchTier::Unmatched);
}

#[test]
fn catalog_store_failure_propagates() {
    let index = UnavailableFuzzyIndex::new("disabled");
    let matcher = CatalogMatcher::new(&FailingCatalog, &index);

    let error = matcher.match_item("Ethanol", Some("E7023"), None).expect_err("store failure");
    assert!(matches!(error, ApplicationError::ReferenceData(LookupError::Failed { .. })));
}

#[test]
fn custom_threshold_is_respected() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index)
        .with_settings(MatchSettings { fuzzy_threshold: 0.9, ..MatchSettings::default() });

    let result = matcher.match_item("Gibco FBS 500ml", None, None).expect("match");
    assert_eq!(result.tier, MatchTier::Unmatched);
}

#[test]
fn repeated_matches_are_identical() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);
    let records = vec![
        PurchaseRecordInput::new("Gibco FBS 500ml"),
        PurchaseRecordInput::new("kit").with_catalog_number("ABC-10"),
        PurchaseRecordInput::new("").with_catalog_number("16000-044"),
        PurchaseRecordInput::new("nothing like it"),
    ];

    let first = matcher.match_batch(&records).expect("first batch");
    let second = matcher.match_batch(&records).expect("second batch");

    assert_eq!(first, second);
    assert_eq!(first.len(), records.len());
}

#[test]
fn confidence_stays_within_tier_range() {
    let snapshot = snapshot();
    let index = TrigramNameIndex::build(snapshot.clone());
    let matcher = CatalogMatcher::new(snapshot.as_ref(), &index);
    let records = vec![
        PurchaseRecordInput::new("x").with_catalog_number("ABC-100"),
        PurchaseRecordInput::new("x").with_catalog_number("ABC-10"),
        PurchaseRecordInput::new("Gibco FBS 500ml"),
        PurchaseRecordInput::new("Phosphate Buffered Saline"),
        PurchaseRecordInput::new("unrelated"),
    ];

    for result in matcher.match_batch(&records).expect("batch") {
        let in_range = match result.tier {
            MatchTier::ExactCatalog => result.confidence == 1.0,
            MatchTier::PrefixCatalog => result.confidence == 0.8,
            MatchTier::FuzzyName => (0.3..1.0).contains(&result.confidence),
            MatchTier::Unmatched => result.confidence == 0.0 && result.product_id.is_none(),
        };
        assert!(in_range, "{result:?}");
    }
}
