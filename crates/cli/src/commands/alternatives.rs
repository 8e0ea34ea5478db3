use labquote_core::domain::product::ProductId;
use labquote_core::similarity::{AlternativeFinder, SimilarityResult, SimilarityScorer};

use super::context::{engine_failure, prepare};
use super::{CommandResult, Invocation};

/// Lists up to `limit` substitutes for `product_id`; the configured default applies when absent.
pub fn run(invocation: &Invocation, product_id: &str, limit: Option<usize>) -> CommandResult {
    let context = match prepare("alternatives", invocation) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let similarity = &context.config.similarity;
    let scorer = SimilarityScorer::new()
        .with_weights(similarity.weights)
        .with_thresholds(similarity.thresholds);
    let catalog = context.snapshot.as_ref();
    let finder = AlternativeFinder::new(catalog, catalog)
        .with_embeddings(catalog)
        .with_scorer(scorer)
        .with_candidate_pool(similarity.candidate_pool);

    let limit = limit.unwrap_or(similarity.default_limit);
    let reference = ProductId(product_id.trim().to_string());
    match finder.find_alternatives(&reference, limit) {
        Ok(results) => {
            CommandResult::success_with_data("alternatives", describe(&reference, &results), &results)
        }
        Err(error) => engine_failure("alternatives", invocation, error),
    }
}

fn describe(reference: &ProductId, results: &[SimilarityResult]) -> String {
    match results.first() {
        Some(best) => format!(
            "{} alternatives for {reference}; best {} (score {:.2})",
            results.len(),
            best.product.id,
            best.score
        ),
        None => format!("no alternatives for {reference}"),
    }
}
