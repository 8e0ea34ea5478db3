use tracing::info;

use super::context::{load_config, open_pool, runtime};
use super::{CommandResult, Invocation};

pub fn run(invocation: &Invocation) -> CommandResult {
    let config = match load_config("migrate", invocation) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        pool.close().await;
        Ok::<(), super::Failure>(())
    });

    match result {
        Ok(()) => {
            info!(event_name = "cli.migrate.applied", "applied pending migrations");
            CommandResult::success("migrate", "applied pending migrations")
        }
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
