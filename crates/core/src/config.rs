use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommend::{
    RecommendationSettings, ALSO_BOUGHT_LIMIT, BEHAVIOR_NEIGHBORS, CONTENT_CANDIDATE_WIDTH,
    MAX_FEATURES, MAX_RECOMMENDATIONS, POPULAR_LIMIT,
};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["glimmer.toml", "config/glimmer.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub recommendations: RecommendationsConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationsConfig {
    pub max_recommendations: usize,
    pub content_candidates: usize,
    pub behavior_neighbors: usize,
    pub also_bought_limit: usize,
    pub popular_limit: usize,
    pub max_features: usize,
    pub content_similarity: bool,
}

impl RecommendationsConfig {
    pub fn settings(&self) -> RecommendationSettings {
        RecommendationSettings {
            max_recommendations: self.max_recommendations,
            content_candidates: self.content_candidates,
            behavior_neighbors: self.behavior_neighbors,
            also_bought_limit: self.also_bought_limit,
            popular_limit: self.popular_limit,
            max_features: self.max_features,
            content_similarity: self.content_similarity,
        }
    }
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
    pub content_similarity: Option<bool>,
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
                url: "sqlite://glimmer.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            recommendations: RecommendationsConfig::default(),
        }
    }
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            max_recommendations: MAX_RECOMMENDATIONS,
            content_candidates: CONTENT_CANDIDATE_WIDTH,
            behavior_neighbors: BEHAVIOR_NEIGHBORS,
            also_bought_limit: ALSO_BOUGHT_LIMIT,
            popular_limit: POPULAR_LIMIT,
            max_features: MAX_FEATURES,
            content_similarity: true,
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
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

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(recommendations) = patch.recommendations {
            let target = &mut self.recommendations;
            if let Some(value) = recommendations.max_recommendations {
                target.max_recommendations = value;
            }
            if let Some(value) = recommendations.content_candidates {
                target.content_candidates = value;
            }
            if let Some(value) = recommendations.behavior_neighbors {
                target.behavior_neighbors = value;
            }
            if let Some(value) = recommendations.also_bought_limit {
                target.also_bought_limit = value;
            }
            if let Some(value) = recommendations.popular_limit {
                target.popular_limit = value;
            }
            if let Some(value) = recommendations.max_features {
                target.max_features = value;
            }
            if let Some(value) = recommendations.content_similarity {
                target.content_similarity = value;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GLIMMER_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("GLIMMER_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("GLIMMER_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("GLIMMER_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("GLIMMER_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("GLIMMER_LOGGING_LEVEL").or_else(|| read_env("GLIMMER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GLIMMER_LOGGING_FORMAT").or_else(|| read_env("GLIMMER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        let target = &mut self.recommendations;
        for (key, slot) in [
            ("GLIMMER_RECOMMENDATIONS_MAX_RECOMMENDATIONS", &mut target.max_recommendations),
            ("GLIMMER_RECOMMENDATIONS_CONTENT_CANDIDATES", &mut target.content_candidates),
            ("GLIMMER_RECOMMENDATIONS_BEHAVIOR_NEIGHBORS", &mut target.behavior_neighbors),
            ("GLIMMER_RECOMMENDATIONS_ALSO_BOUGHT_LIMIT", &mut target.also_bought_limit),
            ("GLIMMER_RECOMMENDATIONS_POPULAR_LIMIT", &mut target.popular_limit),
            ("GLIMMER_RECOMMENDATIONS_MAX_FEATURES", &mut target.max_features),
        ] {
            if let Some(value) = read_env(key) {
                *slot = parse_usize(key, &value)?;
            }
        }
        if let Some(value) = read_env("GLIMMER_RECOMMENDATIONS_CONTENT_SIMILARITY") {
            target.content_similarity =
                parse_bool("GLIMMER_RECOMMENDATIONS_CONTENT_SIMILARITY", &value)?;
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
        if let Some(content_similarity) = overrides.content_similarity {
            self.recommendations.content_similarity = content_similarity;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_logging(&self.logging)?;
        validate_recommendations(&self.recommendations)?;
        Ok(())
    }
}

/// First config file that exists: the explicit path when given, otherwise
/// the conventional locations relative to the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
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

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_recommendations(config: &RecommendationsConfig) -> Result<(), ConfigError> {
    let limits = [
        ("max_recommendations", config.max_recommendations),
        ("content_candidates", config.content_candidates),
        ("behavior_neighbors", config.behavior_neighbors),
        ("also_bought_limit", config.also_bought_limit),
        ("popular_limit", config.popular_limit),
        ("max_features", config.max_features),
    ];
    if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::Validation(format!(
            "recommendations.{name} must be greater than zero"
        )));
    }

    if config.content_candidates < config.max_recommendations {
        return Err(ConfigError::Validation(format!(
            "recommendations.content_candidates ({}) must be at least max_recommendations ({})",
            config.content_candidates, config.max_recommendations
        )));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
    recommendations: Option<RecommendationsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationsPatch {
    max_recommendations: Option<usize>,
    content_candidates: Option<usize>,
    behavior_neighbors: Option<usize>,
    also_bought_limit: Option<usize>,
    popular_limit: Option<usize>,
    max_features: Option<usize>,
    content_similarity: Option<bool>,
}
