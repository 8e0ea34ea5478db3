use labquote_core::config::{AppConfig, LoadOptions};
use labquote_db::{
    connect_with_settings, migrations, CatalogRepository, DbPool, SqlCatalogRepository,
};
use serde::Serialize;

const CATALOG_TABLES: &[&str] = &["vendor", "catalog_product", "vendor_offer", "product_embedding"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, because: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {because}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_fuzzy_index(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["fuzzy_index", "database_connectivity", "catalog_schema", "catalog_data"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_fuzzy_index(config: &AppConfig) -> DoctorCheck {
    let details = if config.matching.fuzzy_index_enabled {
        format!("trigram index enabled (threshold {})", config.matching.fuzzy_threshold)
    } else {
        format!(
            "disabled; name matching degrades to substring containment (confidence {})",
            config.matching.substring_confidence
        )
    };
    DoctorCheck { name: "fuzzy_index", status: CheckStatus::Pass, details }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                DoctorCheck::skipped("catalog_schema", "the database was not reachable"),
                DoctorCheck::skipped("catalog_data", "the database was not reachable"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck::skipped("catalog_schema", "the database was not reachable"),
                    DoctorCheck::skipped("catalog_data", "the database was not reachable"),
                ];
            }
        };

        let mut checks = vec![DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        }];
        let schema = check_schema(&pool).await;
        let schema_ready = schema.status == CheckStatus::Pass;
        checks.push(schema);
        if schema_ready {
            checks.push(check_catalog_data(pool.clone()).await);
        } else {
            checks.push(DoctorCheck::skipped("catalog_data", "catalog tables are missing"));
        }

        pool.close().await;
        checks
    })
}

async fn check_schema(pool: &DbPool) -> DoctorCheck {
    let mut missing = Vec::new();
    for table in CATALOG_TABLES {
        match migrations::table_exists(pool, table).await {
            Ok(true) => {}
            Ok(false) => missing.push(*table),
            Err(error) => {
                return DoctorCheck {
                    name: "catalog_schema",
                    status: CheckStatus::Fail,
                    details: format!("schema inspection failed: {error}"),
                };
            }
        }
    }

    if missing.is_empty() {
        DoctorCheck {
            name: "catalog_schema",
            status: CheckStatus::Pass,
            details: "catalog tables present".to_string(),
        }
    } else {
        DoctorCheck {
            name: "catalog_schema",
            status: CheckStatus::Fail,
            details: format!("missing tables: {}; run `labquote migrate`", missing.join(", ")),
        }
    }
}

async fn check_catalog_data(pool: DbPool) -> DoctorCheck {
    match SqlCatalogRepository::new(pool).load_snapshot().await {
        Ok(snapshot) if snapshot.is_empty() => DoctorCheck {
            name: "catalog_data",
            status: CheckStatus::Fail,
            details: "catalog is empty; run `labquote seed` or import products".to_string(),
        },
        Ok(snapshot) => DoctorCheck {
            name: "catalog_data",
            status: CheckStatus::Pass,
            details: format!(
                "{} products, {} offers, {} embeddings",
                snapshot.len(),
                snapshot.offer_count(),
                snapshot.embedding_count()
            ),
        },
        Err(error) => DoctorCheck {
            name: "catalog_data",
            status: CheckStatus::Fail,
            details: format!("catalog snapshot failed to load: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
