use clap::Args;
use labquote_core::domain::product::ProductId;
use labquote_core::recommend::{ConstrainedRecommender, OptimizationParams, Recommendation};
use rust_decimal::Decimal;

use super::context::{engine_failure, prepare};
use super::{CommandResult, Invocation};

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[arg(required = true, num_args = 1.., help = "Candidate product ids")]
    pub product_ids: Vec<String>,
    #[arg(long, help = "Total spend allowed for the bundle")]
    pub budget: Option<Decimal>,
    #[arg(long = "max-lead-time", help = "Latest acceptable delivery, in days")]
    pub max_lead_time_days: Option<u32>,
    #[arg(long = "prefer-vendor", help = "Preferred vendor id (repeatable)")]
    pub preferred_vendors: Vec<String>,
    #[arg(long = "category", help = "Allowed category (repeatable)")]
    pub required_categories: Vec<String>,
    #[arg(long = "exclude", help = "Product id to leave out (repeatable)")]
    pub excluded_products: Vec<String>,
    #[arg(long, help = "Maximum number of ranked products")]
    pub limit: Option<usize>,
}

impl RecommendArgs {
    fn params(&self) -> OptimizationParams {
        let mut params = OptimizationParams::new();
        if let Some(budget) = self.budget {
            params = params.with_budget(budget);
        }
        if let Some(days) = self.max_lead_time_days {
            params = params.with_max_lead_time_days(days);
        }
        for vendor in &self.preferred_vendors {
            params = params.with_preferred_vendor(vendor.as_str());
        }
        for category in &self.required_categories {
            params = params.with_required_category(category.as_str());
        }
        for product in &self.excluded_products {
            params = params.with_excluded_product(product.as_str());
        }
        params
    }
}

pub fn run(invocation: &Invocation, args: &RecommendArgs) -> CommandResult {
    let context = match prepare("recommend", invocation) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let recommendation_config = &context.config.recommendation;
    let catalog = context.snapshot.as_ref();
    let recommender = ConstrainedRecommender::new(catalog, catalog)
        .with_settings(recommendation_config.settings);

    let product_ids =
        args.product_ids.iter().map(|id| ProductId(id.trim().to_string())).collect::<Vec<_>>();
    let limit = args.limit.unwrap_or(recommendation_config.default_limit);

    match recommender.recommend(&product_ids, &args.params(), limit) {
        Ok(recommendation) => {
            CommandResult::success_with_data("recommend", describe(&recommendation), &recommendation)
        }
        Err(error) => engine_failure("recommend", invocation, error),
    }
}

fn describe(recommendation: &Recommendation) -> String {
    let mut message = format!(
        "{} ranked, {} dropped",
        recommendation.ranked.len(),
        recommendation.dropped.len()
    );
    if let Some(bundle) = &recommendation.bundle {
        message.push_str(&format!(
            "; bundle of {} totals {} with {} remaining",
            bundle.selections.len(),
            bundle.total_price,
            bundle.remaining_budget
        ));
    }
    message
}
