use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use labquote_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// (dotted key, env override, rendered value) for every reported setting.
type ConfigLine = (&'static str, Option<&'static str>, String);

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: cli flag > env > file > default):".to_string(),
    ];
    for (key, env_key, value) in effective_values(&config) {
        lines.push(render_line(
            key,
            &value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<ConfigLine> {
    let similarity = &config.similarity;
    let recommendation = &config.recommendation.settings;
    vec![
        ("database.url", Some("LABQUOTE_DATABASE_URL"), config.database.url.clone()),
        (
            "database.max_connections",
            Some("LABQUOTE_DATABASE_MAX_CONNECTIONS"),
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            Some("LABQUOTE_DATABASE_TIMEOUT_SECS"),
            config.database.timeout_secs.to_string(),
        ),
        (
            "matching.fuzzy_threshold",
            Some("LABQUOTE_MATCHING_FUZZY_THRESHOLD"),
            config.matching.fuzzy_threshold.to_string(),
        ),
        (
            "matching.fuzzy_index_enabled",
            Some("LABQUOTE_MATCHING_FUZZY_INDEX_ENABLED"),
            config.matching.fuzzy_index_enabled.to_string(),
        ),
        ("matching.substring_confidence", None, config.matching.substring_confidence.to_string()),
        ("similarity.weights.semantic", None, similarity.weights.semantic.to_string()),
        ("similarity.weights.specification", None, similarity.weights.specification.to_string()),
        ("similarity.weights.grade", None, similarity.weights.grade.to_string()),
        (
            "similarity.weights.specification_text",
            None,
            similarity.weights.specification_text.to_string(),
        ),
        ("similarity.weights.name", None, similarity.weights.name.to_string()),
        (
            "similarity.thresholds.minimum_score",
            None,
            similarity.thresholds.minimum_score.to_string(),
        ),
        (
            "similarity.candidate_pool",
            Some("LABQUOTE_SIMILARITY_CANDIDATE_POOL"),
            similarity.candidate_pool.to_string(),
        ),
        (
            "similarity.default_limit",
            Some("LABQUOTE_SIMILARITY_DEFAULT_LIMIT"),
            similarity.default_limit.to_string(),
        ),
        ("recommendation.weights.price", None, recommendation.weights.price.to_string()),
        ("recommendation.weights.lead_time", None, recommendation.weights.lead_time.to_string()),
        ("recommendation.weights.vendor", None, recommendation.weights.vendor.to_string()),
        (
            "recommendation.reference_price",
            Some("LABQUOTE_RECOMMENDATION_REFERENCE_PRICE"),
            recommendation.reference_price.to_string(),
        ),
        (
            "recommendation.reference_lead_time_days",
            Some("LABQUOTE_RECOMMENDATION_REFERENCE_LEAD_TIME_DAYS"),
            recommendation.reference_lead_time_days.to_string(),
        ),
        (
            "recommendation.default_limit",
            Some("LABQUOTE_RECOMMENDATION_DEFAULT_LIMIT"),
            config.recommendation.default_limit.to_string(),
        ),
        ("logging.level", Some("LABQUOTE_LOGGING_LEVEL"), config.logging.level.clone()),
        ("logging.format", Some("LABQUOTE_LOGGING_FORMAT"), format!("{:?}", config.logging.format)),
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("labquote.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/labquote.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
