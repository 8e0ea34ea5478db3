//! Shared setup for the engine-backed commands: config, runtime, pool, snapshot.

use std::sync::Arc;

use labquote_core::catalog::{CatalogSnapshot, TrigramNameIndex, UnavailableFuzzyIndex};
use labquote_core::config::AppConfig;
use labquote_core::errors::ApplicationError;
use labquote_core::ports::FuzzyNameIndex;
use labquote_db::{connect_with_settings, migrations, CatalogRepository, DbPool, SqlCatalogRepository};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::{CommandResult, Failure, Invocation};

pub(crate) struct EngineContext {
    pub config: AppConfig,
    pub snapshot: Arc<CatalogSnapshot>,
}

impl EngineContext {
    /// Trigram index over the snapshot, or the degraded substring path when disabled.
    pub fn fuzzy_index(&self) -> Box<dyn FuzzyNameIndex> {
        if self.config.matching.fuzzy_index_enabled {
            Box::new(TrigramNameIndex::build(self.snapshot.clone()))
        } else {
            warn!(
                event_name = "cli.engine.fuzzy_index_disabled",
                "fuzzy index disabled by configuration; using substring fallback"
            );
            Box::new(UnavailableFuzzyIndex::new("disabled by configuration"))
        }
    }
}

pub(crate) fn load_config(command: &str, invocation: &Invocation) -> Result<AppConfig, CommandResult> {
    AppConfig::load(invocation.options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects and applies pending migrations so an empty database is usable.
pub(crate) async fn open_pool(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn prepare(command: &str, invocation: &Invocation) -> Result<EngineContext, CommandResult> {
    let config = load_config(command, invocation)?;
    let runtime = runtime(command)?;

    let snapshot = runtime
        .block_on(async {
            let pool = open_pool(&config).await?;
            let snapshot = SqlCatalogRepository::new(pool.clone())
                .load_snapshot()
                .await
                .map_err(|error| ("catalog_load", error.to_string(), 4u8));
            pool.close().await;
            snapshot
        })
        .map_err(|failure| CommandResult::from_failure(command, failure))?;

    info!(
        event_name = "cli.engine.snapshot_ready",
        products = snapshot.len(),
        offers = snapshot.offer_count(),
        embeddings = snapshot.embedding_count(),
        "catalog snapshot ready"
    );
    Ok(EngineContext { config, snapshot: Arc::new(snapshot) })
}

pub(crate) fn engine_failure(
    command: &str,
    invocation: &Invocation,
    error: ApplicationError,
) -> CommandResult {
    let interface = error.into_interface(invocation.correlation_id.clone());
    CommandResult::failure(
        command,
        "engine",
        format!("{} ({interface}; correlation_id={})", interface.user_message(), invocation.correlation_id),
        7,
    )
}
