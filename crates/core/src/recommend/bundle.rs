//! Greedy budget allocation over scored products

use rust_decimal::Decimal;

use super::types::{BundleSelection, RecommendationBundle, ScoredProduct};

/// Accepts products best-composite first while their price fits the
/// remaining budget. Equal composites keep the order they were given in.
pub fn assemble_bundle(scored: &[ScoredProduct], budget: Decimal) -> RecommendationBundle {
    let mut order = scored.iter().collect::<Vec<_>>();
    order.sort_by(|left, right| right.composite.total_cmp(&left.composite));

    let mut remaining = budget;
    let mut total = Decimal::ZERO;
    let mut selections = Vec::new();
    for candidate in order {
        let price = candidate.offer.price;
        if price > remaining {
            continue;
        }
        remaining -= price;
        total += price;
        selections.push(BundleSelection {
            product_id: candidate.product.id.clone(),
            offer: candidate.offer.clone(),
            composite: candidate.composite,
        });
    }

    let lead_times = selections
        .iter()
        .filter_map(|selection| selection.offer.lead_time_days)
        .map(f64::from)
        .collect::<Vec<_>>();
    let mean_lead_time_days = (!lead_times.is_empty())
        .then(|| lead_times.iter().sum::<f64>() / lead_times.len() as f64);

    RecommendationBundle { selections, total_price: total, remaining_budget: remaining, mean_lead_time_days }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::assemble_bundle;
    use crate::domain::offer::VendorOffer;
    use crate::domain::product::CatalogProduct;
    use crate::recommend::ScoredProduct;

    fn scored(id: &str, price: i64, lead: Option<u32>, composite: f64) -> ScoredProduct {
        ScoredProduct {
            product: CatalogProduct::new(id, id),
            offer: VendorOffer::new(id, "v-1", Decimal::new(price, 0), lead),
            price_score: 0.0,
            lead_time_score: 0.0,
            vendor_score: 0.0,
            composite,
        }
    }

    #[test]
    fn greedy_allocation_skips_items_that_no_longer_fit() {
        let products = vec![
            scored("a", 60_000, Some(4), 70.0),
            scored("b", 50_000, Some(2), 90.0),
            scored("c", 30_000, None, 60.0),
        ];

        let bundle = assemble_bundle(&products, Decimal::new(100_000, 0));

        let ids = bundle.selections.iter().map(|s| s.product_id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(bundle.total_price, Decimal::new(80_000, 0));
        assert_eq!(bundle.remaining_budget, Decimal::new(20_000, 0));
        assert_eq!(bundle.mean_lead_time_days, Some(2.0));
    }

    #[test]
    fn equal_composites_keep_candidate_order() {
        let products =
            vec![scored("first", 70_000, Some(3), 50.0), scored("second", 70_000, Some(1), 50.0)];

        let bundle = assemble_bundle(&products, Decimal::new(100_000, 0));

        assert_eq!(bundle.selections.len(), 1);
        assert_eq!(bundle.selections[0].product_id.0, "first");
    }

    #[test]
    fn totals_never_exceed_budget() {
        let products = (0..8)
            .map(|index| scored(&format!("p-{index}"), 10_000 + index * 7_500, Some(5), 100.0 - index as f64))
            .collect::<Vec<_>>();
        let budget = Decimal::new(95_000, 0);

        let bundle = assemble_bundle(&products, budget);

        assert!(bundle.total_price <= budget);
        assert_eq!(bundle.remaining_budget, budget - bundle.total_price);
        assert!(bundle.remaining_budget >= Decimal::ZERO);
    }

    #[test]
    fn empty_selection_has_no_mean_lead_time() {
        let products = vec![scored("a", 10_000, Some(3), 10.0)];

        let bundle = assemble_bundle(&products, Decimal::new(5_000, 0));

        assert!(bundle.selections.is_empty());
        assert_eq!(bundle.mean_lead_time_days, None);
        assert_eq!(bundle.remaining_budget, Decimal::new(5_000, 0));
    }
}
