use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{
    MatchSettings, DEFAULT_FUZZY_THRESHOLD, MIN_FUZZY_CONFIDENCE, SUBSTRING_FALLBACK_CONFIDENCE,
};
use crate::recommend::{RecommendationSettings, DEFAULT_RECOMMENDATION_LIMIT};
use crate::similarity::{
    SimilarityThresholds, SimilarityWeights, DEFAULT_ALTERNATIVE_LIMIT, DEFAULT_CANDIDATE_POOL,
};

#[derive(Clone, Debug, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub matching: MatchingConfig,
    pub similarity: SimilarityConfig,
    pub recommendation: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchingConfig {
    pub fuzzy_threshold: f64,
    pub substring_confidence: f64,
    /// When false the matcher runs in degraded mode (substring containment).
    pub fuzzy_index_enabled: bool,
}

impl MatchingConfig {
    pub fn settings(&self) -> MatchSettings {
        MatchSettings {
            fuzzy_threshold: self.fuzzy_threshold,
            substring_confidence: self.substring_confidence,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    pub thresholds: SimilarityThresholds,
    pub candidate_pool: usize,
    pub default_limit: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecommendationConfig {
    pub settings: RecommendationSettings,
    pub default_limit: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub fuzzy_threshold: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://labquote.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            matching: MatchingConfig {
                fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
                substring_confidence: SUBSTRING_FALLBACK_CONFIDENCE,
                fuzzy_index_enabled: true,
            },
            similarity: SimilarityConfig {
                weights: SimilarityWeights::default(),
                thresholds: SimilarityThresholds::default(),
                candidate_pool: DEFAULT_CANDIDATE_POOL,
                default_limit: DEFAULT_ALTERNATIVE_LIMIT,
            },
            recommendation: RecommendationConfig {
                settings: RecommendationSettings::default(),
                default_limit: DEFAULT_RECOMMENDATION_LIMIT,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("labquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(fuzzy_threshold) = matching.fuzzy_threshold {
                self.matching.fuzzy_threshold = fuzzy_threshold;
            }
            if let Some(substring_confidence) = matching.substring_confidence {
                self.matching.substring_confidence = substring_confidence;
            }
            if let Some(enabled) = matching.fuzzy_index_enabled {
                self.matching.fuzzy_index_enabled = enabled;
            }
        }

        if let Some(similarity) = patch.similarity {
            if let Some(weights) = similarity.weights {
                let target = &mut self.similarity.weights;
                apply(&mut target.semantic, weights.semantic);
                apply(&mut target.specification, weights.specification);
                apply(&mut target.grade, weights.grade);
                apply(&mut target.specification_text, weights.specification_text);
                apply(&mut target.name, weights.name);
            }
            if let Some(thresholds) = similarity.thresholds {
                let target = &mut self.similarity.thresholds;
                apply(&mut target.semantic, thresholds.semantic);
                apply(&mut target.specification, thresholds.specification);
                apply(&mut target.specification_text, thresholds.specification_text);
                apply(&mut target.name, thresholds.name);
                apply(&mut target.minimum_score, thresholds.minimum_score);
            }
            apply(&mut self.similarity.candidate_pool, similarity.candidate_pool);
            apply(&mut self.similarity.default_limit, similarity.default_limit);
        }

        if let Some(recommendation) = patch.recommendation {
            let settings = &mut self.recommendation.settings;
            if let Some(weights) = recommendation.weights {
                apply(&mut settings.weights.price, weights.price);
                apply(&mut settings.weights.lead_time, weights.lead_time);
                apply(&mut settings.weights.vendor, weights.vendor);
            }
            apply(&mut settings.reference_price, recommendation.reference_price);
            apply(&mut settings.reference_lead_time_days, recommendation.reference_lead_time_days);
            apply(&mut settings.preferred_vendor_score, recommendation.preferred_vendor_score);
            apply(&mut settings.other_vendor_score, recommendation.other_vendor_score);
            apply(&mut settings.unknown_lead_time_score, recommendation.unknown_lead_time_score);
            apply(&mut self.recommendation.default_limit, recommendation.default_limit);
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LABQUOTE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LABQUOTE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("LABQUOTE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LABQUOTE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("LABQUOTE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LABQUOTE_MATCHING_FUZZY_THRESHOLD") {
            self.matching.fuzzy_threshold = parse_env("LABQUOTE_MATCHING_FUZZY_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("LABQUOTE_MATCHING_FUZZY_INDEX_ENABLED") {
            self.matching.fuzzy_index_enabled =
                parse_env("LABQUOTE_MATCHING_FUZZY_INDEX_ENABLED", &value)?;
        }

        if let Some(value) = read_env("LABQUOTE_SIMILARITY_CANDIDATE_POOL") {
            self.similarity.candidate_pool =
                parse_env("LABQUOTE_SIMILARITY_CANDIDATE_POOL", &value)?;
        }
        if let Some(value) = read_env("LABQUOTE_SIMILARITY_DEFAULT_LIMIT") {
            self.similarity.default_limit = parse_env("LABQUOTE_SIMILARITY_DEFAULT_LIMIT", &value)?;
        }

        if let Some(value) = read_env("LABQUOTE_RECOMMENDATION_REFERENCE_PRICE") {
            self.recommendation.settings.reference_price =
                parse_env("LABQUOTE_RECOMMENDATION_REFERENCE_PRICE", &value)?;
        }
        if let Some(value) = read_env("LABQUOTE_RECOMMENDATION_REFERENCE_LEAD_TIME_DAYS") {
            self.recommendation.settings.reference_lead_time_days =
                parse_env("LABQUOTE_RECOMMENDATION_REFERENCE_LEAD_TIME_DAYS", &value)?;
        }
        if let Some(value) = read_env("LABQUOTE_RECOMMENDATION_DEFAULT_LIMIT") {
            self.recommendation.default_limit =
                parse_env("LABQUOTE_RECOMMENDATION_DEFAULT_LIMIT", &value)?;
        }

        let log_level =
            read_env("LABQUOTE_LOGGING_LEVEL").or_else(|| read_env("LABQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LABQUOTE_LOGGING_FORMAT").or_else(|| read_env("LABQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(fuzzy_threshold) = overrides.fuzzy_threshold {
            self.matching.fuzzy_threshold = fuzzy_threshold;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_matching(&self.matching)?;
        validate_similarity(&self.similarity)?;
        validate_recommendation(&self.recommendation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn apply<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("labquote.toml"), PathBuf::from("config/labquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

/// Both settings bound the confidence of FUZZY_NAME results, which must stay in [0.3, 1).
fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    let name_confidence = MIN_FUZZY_CONFIDENCE..1.0;

    let threshold = matching.fuzzy_threshold;
    if !name_confidence.contains(&threshold) {
        return Err(ConfigError::Validation(format!(
            "matching.fuzzy_threshold must be in range [{MIN_FUZZY_CONFIDENCE}, 1), got {threshold}"
        )));
    }

    let confidence = matching.substring_confidence;
    if !name_confidence.contains(&confidence) {
        return Err(ConfigError::Validation(format!(
            "matching.substring_confidence must be in range [{MIN_FUZZY_CONFIDENCE}, 1), got {confidence}"
        )));
    }

    Ok(())
}

fn validate_similarity(similarity: &SimilarityConfig) -> Result<(), ConfigError> {
    similarity.weights.validate().map_err(|error| ConfigError::Validation(error.to_string()))?;
    similarity.thresholds.validate().map_err(|error| ConfigError::Validation(error.to_string()))?;

    if similarity.candidate_pool == 0 {
        return Err(ConfigError::Validation(
            "similarity.candidate_pool must be greater than zero".to_string(),
        ));
    }
    if similarity.default_limit == 0 {
        return Err(ConfigError::Validation(
            "similarity.default_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    recommendation
        .settings
        .validate()
        .map_err(|error| ConfigError::Validation(error.to_string()))?;

    if recommendation.default_limit == 0 {
        return Err(ConfigError::Validation(
            "recommendation.default_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    matching: Option<MatchingPatch>,
    similarity: Option<SimilarityPatch>,
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    fuzzy_threshold: Option<f64>,
    substring_confidence: Option<f64>,
    fuzzy_index_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityPatch {
    weights: Option<SimilarityWeightsPatch>,
    thresholds: Option<SimilarityThresholdsPatch>,
    candidate_pool: Option<usize>,
    default_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityWeightsPatch {
    semantic: Option<f64>,
    specification: Option<f64>,
    grade: Option<f64>,
    specification_text: Option<f64>,
    name: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SimilarityThresholdsPatch {
    semantic: Option<f64>,
    specification: Option<f64>,
    specification_text: Option<f64>,
    name: Option<f64>,
    minimum_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    weights: Option<RecommendationWeightsPatch>,
    reference_price: Option<f64>,
    reference_lead_time_days: Option<u32>,
    preferred_vendor_score: Option<f64>,
    other_vendor_score: Option<f64>,
    unknown_lead_time_score: Option<f64>,
    default_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationWeightsPatch {
    price: Option<f64>,
    lead_time: Option<f64>,
    vendor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
