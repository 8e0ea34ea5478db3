//! Offer selection and ranking under budget and lead-time constraints

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use super::bundle::assemble_bundle;
use super::types::*;
use crate::domain::offer::VendorOffer;
use crate::domain::product::{CatalogProduct, ProductId};
use crate::errors::ApplicationError;
use crate::ports::{CatalogLookup, VendorOfferLookup};

pub struct ConstrainedRecommender<'a> {
    catalog: &'a dyn CatalogLookup,
    offers: &'a dyn VendorOfferLookup,
    settings: RecommendationSettings,
}

impl<'a> ConstrainedRecommender<'a> {
    pub fn new(catalog: &'a dyn CatalogLookup, offers: &'a dyn VendorOfferLookup) -> Self {
        Self { catalog, offers, settings: RecommendationSettings::default() }
    }

    pub fn with_settings(mut self, settings: RecommendationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Scores every distinct candidate, ranks the survivors and, when a
    /// budget is given, allocates it greedily across them.
    ///
    /// Candidates that cannot be recommended are reported in `dropped`
    /// rather than failing the call; only lookup failures are errors.
    pub fn recommend(
        &self,
        candidate_ids: &[ProductId],
        params: &OptimizationParams,
        limit: usize,
    ) -> Result<Recommendation, ApplicationError> {
        let mut seen = HashSet::new();
        let mut scored = Vec::new();
        let mut dropped = Vec::new();

        for product_id in candidate_ids {
            if !seen.insert(product_id) {
                continue;
            }
            match self.evaluate(product_id, params)? {
                Ok(product) => scored.push(product),
                Err(reason) => {
                    dropped.push(DroppedProduct { product_id: product_id.clone(), reason })
                }
            }
        }

        let bundle = match params.budget {
            Some(budget) if !scored.is_empty() => Some(assemble_bundle(&scored, budget)),
            _ => None,
        };

        // Stable: equal composites keep candidate order.
        let mut ranked = scored;
        ranked.sort_by(|left, right| right.composite.total_cmp(&left.composite));
        ranked.truncate(limit);

        info!(
            event_name = "engine.recommend.completed",
            candidates = seen.len(),
            ranked = ranked.len(),
            dropped = dropped.len(),
            bundled = bundle.as_ref().map_or(0, |bundle| bundle.selections.len()),
            "recommendation computed"
        );

        Ok(Recommendation { ranked, dropped, bundle })
    }

    fn evaluate(
        &self,
        product_id: &ProductId,
        params: &OptimizationParams,
    ) -> Result<Result<ScoredProduct, DropReason>, ApplicationError> {
        if params.excludes(product_id) {
            return Ok(Err(DropReason::Excluded));
        }
        let Some(product) = self.catalog.product(product_id)? else {
            return Ok(Err(DropReason::NotFound));
        };
        if !params.allows_category(&product) {
            return Ok(Err(DropReason::CategoryNotAllowed));
        }

        let offers = self.offers.offers_for(product_id)?;
        if offers.is_empty() {
            return Ok(Err(DropReason::NoOffers));
        }

        Ok(self.best_offer(product, offers, params))
    }

    /// Highest composite among admissible offers; the earliest-listed offer
    /// wins on equal composites.
    fn best_offer(
        &self,
        product: CatalogProduct,
        offers: Vec<VendorOffer>,
        params: &OptimizationParams,
    ) -> Result<ScoredProduct, DropReason> {
        let mut over_budget = false;
        let mut over_lead_time = false;
        let mut best: Option<(VendorOffer, OfferScores)> = None;

        for offer in offers {
            let exceeds_budget = params.budget.is_some_and(|budget| offer.price > budget);
            let exceeds_lead_time = match (params.max_lead_time_days, offer.lead_time_days) {
                (Some(cap), Some(days)) => days > 0 && days > cap,
                _ => false,
            };
            if exceeds_budget || exceeds_lead_time {
                over_budget |= exceeds_budget;
                over_lead_time |= exceeds_lead_time;
                continue;
            }

            let scores = self.score_offer(&offer, params);
            if best.as_ref().map_or(true, |(_, current)| scores.composite > current.composite) {
                best = Some((offer, scores));
            }
        }

        match best {
            Some((offer, scores)) => Ok(ScoredProduct {
                product,
                offer,
                price_score: scores.price,
                lead_time_score: scores.lead_time,
                vendor_score: scores.vendor,
                composite: scores.composite,
            }),
            None => Err(match (over_budget, over_lead_time) {
                (true, true) => DropReason::BudgetAndLeadTimeExceeded,
                (false, true) => DropReason::LeadTimeExceeded,
                _ => DropReason::BudgetExceeded,
            }),
        }
    }

    fn score_offer(&self, offer: &VendorOffer, params: &OptimizationParams) -> OfferScores {
        let price_ceiling = params.budget.map_or(self.settings.reference_price, decimal_to_f64);
        let price = headroom_score(decimal_to_f64(offer.price), price_ceiling);

        let lead_time = match offer.lead_time_days {
            Some(days) => headroom_score(
                f64::from(days),
                f64::from(params.max_lead_time_days.unwrap_or(self.settings.reference_lead_time_days)),
            ),
            None => self.settings.unknown_lead_time_score,
        };

        let vendor = if params.is_preferred(offer) {
            self.settings.preferred_vendor_score
        } else {
            self.settings.other_vendor_score
        };

        let weights = &self.settings.weights;
        OfferScores {
            price,
            lead_time,
            vendor,
            composite: weights.price * price + weights.lead_time * lead_time + weights.vendor * vendor,
        }
    }
}

struct OfferScores {
    price: f64,
    lead_time: f64,
    vendor: f64,
    composite: f64,
}

/// 100 × (1 − value / ceiling), clamped to [0, 100]. A non-positive ceiling
/// leaves full marks only for a zero value.
fn headroom_score(value: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 {
        return if value <= 0.0 { 100.0 } else { 0.0 };
    }
    (100.0 * (1.0 - value / ceiling)).clamp(0.0, 100.0)
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::MAX)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::ports::LookupError;
    use crate::recommend::{OTHER_VENDOR_SCORE, PREFERRED_VENDOR_SCORE, UNKNOWN_LEAD_TIME_SCORE};

    fn krw(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn scenario_a() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![CatalogProduct::new("P1", "Reagent Kit A")
                .with_category("Reagents")
                .with_catalog_number("ABC-100")],
            vec![
                VendorOffer::new("P1", "V1", krw(100_000), Some(5)),
                VendorOffer::new("P1", "V2", krw(90_000), Some(10)),
            ],
        )
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                CatalogProduct::new("tips", "Pipette tips").with_category("Consumables"),
                CatalogProduct::new("gloves", "Nitrile gloves").with_category("Consumables"),
                CatalogProduct::new("ethanol", "Ethanol absolute").with_category("Chemicals"),
                CatalogProduct::new("orphan", "Discontinued stirrer").with_category("Equipment"),
            ],
            vec![
                VendorOffer::new("tips", "v-fast", krw(40_000), Some(1)),
                VendorOffer::new("tips", "v-cheap", krw(25_000), Some(14)),
                VendorOffer::new("gloves", "v-cheap", krw(30_000), None),
                VendorOffer::new("ethanol", "v-fast", krw(55_000), Some(0)),
            ],
        )
    }

    #[test]
    fn scenario_a_budget_selects_cheaper_vendor() {
        let snapshot = scenario_a();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let params = OptimizationParams::new().with_budget(krw(95_000));

        let result = recommender.recommend(&[ProductId::from("P1")], &params, 10).expect("recommend");

        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.ranked[0].offer.vendor_id.0, "V2");
        let bundle = result.bundle.expect("bundle");
        assert_eq!(bundle.total_price, krw(90_000));
        assert_eq!(bundle.remaining_budget, krw(5_000));
        assert_eq!(bundle.mean_lead_time_days, Some(10.0));
    }

    #[test]
    fn scenario_a_budget_and_lead_time_cap_leaves_nothing() {
        let snapshot = scenario_a();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let params = OptimizationParams::new().with_budget(krw(95_000)).with_max_lead_time_days(7);

        let result = recommender.recommend(&[ProductId::from("P1")], &params, 10).expect("recommend");

        assert!(result.ranked.is_empty());
        assert_eq!(result.bundle, None);
        assert_eq!(result.dropped, vec![DroppedProduct {
            product_id: ProductId::from("P1"),
            reason: DropReason::BudgetAndLeadTimeExceeded,
        }]);
    }

    #[test]
    fn single_constraint_drop_reasons() {
        let snapshot = scenario_a();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let candidates = [ProductId::from("P1")];

        let budget = recommender
            .recommend(&candidates, &OptimizationParams::new().with_budget(krw(50_000)), 10)
            .expect("recommend");
        assert_eq!(budget.dropped[0].reason, DropReason::BudgetExceeded);

        let lead = recommender
            .recommend(&candidates, &OptimizationParams::new().with_max_lead_time_days(3), 10)
            .expect("recommend");
        assert_eq!(lead.dropped[0].reason, DropReason::LeadTimeExceeded);
        assert_eq!(lead.bundle, None);
    }

    #[test]
    fn selected_offers_respect_every_constraint() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let candidates =
            ["tips", "gloves", "ethanol", "orphan"].map(ProductId::from).to_vec();

        for budget in [20_000, 30_000, 45_000, 60_000, 200_000] {
            for cap in [1, 5, 30] {
                let params =
                    OptimizationParams::new().with_budget(krw(budget)).with_max_lead_time_days(cap);
                let result = recommender.recommend(&candidates, &params, 10).expect("recommend");

                for scored in &result.ranked {
                    assert!(scored.offer.price <= krw(budget));
                    assert!(scored.offer.lead_time_days.map_or(true, |days| days <= cap));
                }
                if let Some(bundle) = result.bundle {
                    assert!(bundle.total_price <= krw(budget));
                    assert_eq!(bundle.remaining_budget, krw(budget) - bundle.total_price);
                }
            }
        }
    }

    #[test]
    fn unknown_lead_time_passes_cap_with_neutral_score() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let params = OptimizationParams::new().with_max_lead_time_days(2);

        let result =
            recommender.recommend(&[ProductId::from("gloves")], &params, 10).expect("recommend");

        assert_eq!(result.ranked[0].lead_time_score, UNKNOWN_LEAD_TIME_SCORE);
        assert_eq!(result.bundle, None);
    }

    #[test]
    fn zero_lead_time_scores_full_marks() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);

        let result = recommender
            .recommend(&[ProductId::from("ethanol")], &OptimizationParams::new(), 10)
            .expect("recommend");

        let scored = &result.ranked[0];
        assert_eq!(scored.lead_time_score, 100.0);
        // 100 × (1 − 55,000 / 1,000,000) against the reference price
        assert!((scored.price_score - 94.5).abs() < 1e-9);
        assert_eq!(scored.vendor_score, OTHER_VENDOR_SCORE);
    }

    #[test]
    fn preferred_vendor_can_outweigh_price() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let tips = [ProductId::from("tips")];

        let neutral = recommender.recommend(&tips, &OptimizationParams::new(), 10).expect("ok");
        assert_eq!(neutral.ranked[0].offer.vendor_id.0, "v-fast");

        let params = OptimizationParams::new().with_preferred_vendor("v-cheap");
        let preferred = recommender.recommend(&tips, &params, 10).expect("ok");
        assert_eq!(preferred.ranked[0].offer.vendor_id.0, "v-cheap");
        assert_eq!(preferred.ranked[0].vendor_score, PREFERRED_VENDOR_SCORE);
    }

    #[test]
    fn filters_produce_drop_reasons_in_candidate_order() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let params = OptimizationParams::new()
            .with_required_category("consumables")
            .with_required_category("Equipment")
            .with_excluded_product("gloves");
        let candidates = ["missing", "gloves", "ethanol", "orphan", "tips", "tips"]
            .map(ProductId::from)
            .to_vec();

        let result = recommender.recommend(&candidates, &params, 10).expect("recommend");

        let reasons = result
            .dropped
            .iter()
            .map(|dropped| (dropped.product_id.0.as_str(), dropped.reason))
            .collect::<Vec<_>>();
        assert_eq!(reasons, vec![
            ("missing", DropReason::NotFound),
            ("gloves", DropReason::Excluded),
            ("ethanol", DropReason::CategoryNotAllowed),
            ("orphan", DropReason::NoOffers),
        ]);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.ranked[0].product.id.0, "tips");
    }

    #[test]
    fn ranking_is_truncated_but_bundle_considers_all() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &snapshot);
        let params = OptimizationParams::new().with_budget(krw(200_000));
        let candidates = ["tips", "gloves", "ethanol"].map(ProductId::from).to_vec();

        let result = recommender.recommend(&candidates, &params, 1).expect("recommend");

        assert_eq!(result.ranked.len(), 1);
        let bundle = result.bundle.expect("bundle");
        assert_eq!(bundle.selections.len(), 3);
        assert!(result.ranked[0].composite >= bundle.selections[2].composite);
    }

    struct FailingOffers;

    impl VendorOfferLookup for FailingOffers {
        fn offers_for(&self, _product_id: &ProductId) -> Result<Vec<VendorOffer>, LookupError> {
            Err(LookupError::Failed { port: "vendor offers", reason: "disk I/O error".to_owned() })
        }
    }

    #[test]
    fn offer_store_failure_propagates() {
        let snapshot = catalog();
        let recommender = ConstrainedRecommender::new(&snapshot, &FailingOffers);

        let error = recommender
            .recommend(&[ProductId::from("tips")], &OptimizationParams::new(), 10)
            .expect_err("failure");
        assert!(matches!(error, ApplicationError::ReferenceData(_)));
    }

    #[test]
    fn headroom_handles_non_positive_ceilings() {
        assert_eq!(headroom_score(0.0, 0.0), 100.0);
        assert_eq!(headroom_score(10.0, 0.0), 0.0);
        assert_eq!(headroom_score(150.0, 100.0), 0.0);
        assert_eq!(headroom_score(25.0, 100.0), 75.0);
    }
}
