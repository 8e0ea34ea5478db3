use std::fs;
use std::path::Path;

use anyhow::Context;
use labquote_core::domain::purchase::PurchaseRecordInput;
use labquote_core::matching::{CatalogMatcher, MatchResult};
use serde::Serialize;

use super::context::{engine_failure, prepare};
use super::{CommandResult, Invocation};

pub fn run(
    invocation: &Invocation,
    item_name: &str,
    catalog_number: Option<&str>,
    vendor_hint: Option<&str>,
) -> CommandResult {
    let context = match prepare("match", invocation) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let fuzzy_index = context.fuzzy_index();
    let matcher = CatalogMatcher::new(context.snapshot.as_ref(), fuzzy_index.as_ref())
        .with_settings(context.config.matching.settings());

    match matcher.match_item(item_name, catalog_number, vendor_hint) {
        Ok(result) => CommandResult::success_with_data("match", describe(&result), &result),
        Err(error) => engine_failure("match", invocation, error),
    }
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    matched: usize,
    total: usize,
    results: Vec<MatchResult>,
}

/// Matches every record in a JSON array of purchase rows, keeping input order.
pub fn run_batch(invocation: &Invocation, input: &Path) -> CommandResult {
    let records = match read_records(input) {
        Ok(records) => records,
        Err(error) => {
            return CommandResult::failure("match-batch", "input_validation", format!("{error:#}"), 2);
        }
    };

    let context = match prepare("match-batch", invocation) {
        Ok(context) => context,
        Err(result) => return result,
    };
    let fuzzy_index = context.fuzzy_index();
    let matcher = CatalogMatcher::new(context.snapshot.as_ref(), fuzzy_index.as_ref())
        .with_settings(context.config.matching.settings());

    match matcher.match_batch(&records) {
        Ok(results) => {
            let output = BatchOutput {
                matched: results.iter().filter(|result| result.is_matched()).count(),
                total: results.len(),
                results,
            };
            let message = format!("matched {} of {} records", output.matched, output.total);
            CommandResult::success_with_data("match-batch", message, &output)
        }
        Err(error) => engine_failure("match-batch", invocation, error),
    }
}

fn read_records(input: &Path) -> anyhow::Result<Vec<PurchaseRecordInput>> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("could not read purchase records from `{}`", input.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a JSON array of purchase records", input.display()))
}

fn describe(result: &MatchResult) -> String {
    match &result.product_id {
        Some(product_id) => format!(
            "matched {product_id} via {} (confidence {:.2})",
            result.tier.as_str(),
            result.confidence
        ),
        None => format!("no match: {}", result.reason),
    }
}
