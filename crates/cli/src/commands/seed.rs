use labquote_db::{CatalogSeedDataset, ProductSeedInfo};

use super::context::{load_config, open_pool, runtime};
use super::{CommandResult, Failure, Invocation};

pub fn run(invocation: &Invocation) -> CommandResult {
    let config = match load_config("seed", invocation) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;

        let seed_result = CatalogSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = CatalogSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, Failure> = if !verification.all_present {
            Err(("seed_verification", verification_message(&verification.checks), 6u8))
        } else {
            Ok(SeedOutput {
                products: seed_result.products_seeded,
                vendors: seed_result.vendors_seeded,
            })
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let product_lines: Vec<String> = output
                .products
                .iter()
                .map(|p| format!("  - {} [{}] ({})", p.product_id, p.category, p.description))
                .collect();
            let message = format!(
                "catalog seed loaded: {} products from {} vendors:\n{}",
                output.products.len(),
                output.vendors,
                product_lines.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

struct SeedOutput {
    products: Vec<ProductSeedInfo>,
    vendors: usize,
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("vendors", true), ("prod-pbs", false), ("embedding-present", false)];

        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for checks: prod-pbs, embedding-present"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("vendors", true), ("prod-pbs", true)];

        assert_eq!(verification_message(&checks), "Some seed data failed to load");
    }
}
