pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use labquote_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tracing::Level;

use commands::recommend::RecommendArgs;
use commands::{CommandResult, Invocation};

#[derive(Debug, Parser)]
#[command(
    name = "labquote",
    about = "Lab catalog matching and recommendation CLI",
    long_about = "Match purchase records to the catalog, find substitute products, and recommend \
                  vendor offers under budget and lead-time constraints.",
    after_help = "Examples:\n  labquote seed\n  labquote match \"Gibco FBS 500ml\"\n  \
                  labquote alternatives prod-fbs-gibco --limit 3\n  \
                  labquote recommend prod-abc-kit --budget 95000 --max-lead-time 7"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a labquote.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(long, global = true, value_parser = parse_log_format, help = "compact|pretty|json")]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve one free-text purchase record to a catalog product")]
    Match {
        item_name: String,
        #[arg(long, help = "Vendor catalog number, if known")]
        catalog_number: Option<String>,
        #[arg(long, help = "Brand or vendor name restricting the search")]
        vendor: Option<String>,
        #[arg(long, help = "Override matching.fuzzy_threshold")]
        fuzzy_threshold: Option<f64>,
    },
    #[command(about = "Resolve a JSON array of purchase records")]
    MatchBatch {
        #[arg(long, help = "Path to a JSON array of purchase records")]
        input: PathBuf,
    },
    #[command(about = "List substitute products ranked by similarity")]
    Alternatives {
        product_id: String,
        #[arg(long, help = "Maximum number of alternatives")]
        limit: Option<usize>,
    },
    #[command(about = "Rank vendor offers under budget and lead-time constraints")]
    Recommend(RecommendArgs),
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic catalog seed dataset")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity, and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Match { .. } => "match",
            Command::MatchBatch { .. } => "match-batch",
            Command::Alternatives { .. } => "alternatives",
            Command::Recommend(_) => "recommend",
            Command::Migrate => "migrate",
            Command::Seed => "seed",
            Command::Config => "config",
            Command::Doctor { .. } => "doctor",
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse::<LogFormat>().map_err(|error| error.to_string())
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        let fuzzy_threshold = match &self.command {
            Command::Match { fuzzy_threshold, .. } => *fuzzy_threshold,
            _ => None,
        };
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                fuzzy_threshold,
            },
        }
    }
}

/// Logs go to stderr so stdout stays a single JSON document per command.
fn init_logging(config: &AppConfig) {
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when commands run in-process.
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let invocation = Invocation::new(cli.load_options());
    if let Ok(config) = AppConfig::load(invocation.options.clone()) {
        init_logging(&config);
    }

    let span = tracing::info_span!(
        "labquote",
        command = cli.command.name(),
        correlation_id = %invocation.correlation_id
    );
    let _entered = span.enter();

    let result = match &cli.command {
        Command::Match { item_name, catalog_number, vendor, .. } => commands::match_item::run(
            &invocation,
            item_name,
            catalog_number.as_deref(),
            vendor.as_deref(),
        ),
        Command::MatchBatch { input } => commands::match_item::run_batch(&invocation, input),
        Command::Alternatives { product_id, limit } => {
            commands::alternatives::run(&invocation, product_id, *limit)
        }
        Command::Recommend(args) => commands::recommend::run(&invocation, args),
        Command::Migrate => commands::migrate::run(&invocation),
        Command::Seed => commands::seed::run(&invocation),
        Command::Config => {
            CommandResult { exit_code: 0, output: commands::config::run(&invocation.options) }
        }
        Command::Doctor { json } => CommandResult {
            exit_code: 0,
            output: commands::doctor::run(&invocation.options, *json),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use labquote_core::config::LogFormat;

    use super::Cli;

    #[test]
    fn global_flags_become_load_overrides() {
        let cli = Cli::try_parse_from([
            "labquote",
            "match",
            "Gibco FBS",
            "--fuzzy-threshold",
            "0.45",
            "--database-url",
            "sqlite::memory:",
            "--log-format",
            "json",
        ])
        .expect("parse");

        let options = cli.load_options();

        assert!(!options.require_file);
        assert_eq!(options.overrides.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(options.overrides.log_format, Some(LogFormat::Json));
        assert_eq!(options.overrides.fuzzy_threshold, Some(0.45));
    }

    #[test]
    fn explicit_config_path_is_required_to_exist() {
        let cli = Cli::try_parse_from(["labquote", "--config", "missing.toml", "config"])
            .expect("parse");

        let options = cli.load_options();

        assert!(options.require_file);
        assert_eq!(cli.command.name(), "config");
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["labquote", "--log-format", "xml", "seed"]).is_err());
    }
}
