use std::env;
use std::fs;
use std::path::Path;

use glimmer_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{load_config, CommandResult};

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = config_file_path.as_deref().and_then(load_config_file_doc);

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in fields(&config) {
        let source = if overridden(options, field.key) {
            "flag".to_string()
        } else {
            field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    let database = &config.database;
    let logging = &config.logging;
    let recommendations = &config.recommendations;

    vec![
        ConfigField {
            key: "database.url",
            value: database.url.clone(),
            env_keys: &["GLIMMER_DATABASE_URL"],
        },
        ConfigField {
            key: "database.max_connections",
            value: database.max_connections.to_string(),
            env_keys: &["GLIMMER_DATABASE_MAX_CONNECTIONS"],
        },
        ConfigField {
            key: "database.timeout_secs",
            value: database.timeout_secs.to_string(),
            env_keys: &["GLIMMER_DATABASE_TIMEOUT_SECS"],
        },
        ConfigField {
            key: "logging.level",
            value: logging.level.clone(),
            env_keys: &["GLIMMER_LOGGING_LEVEL", "GLIMMER_LOG_LEVEL"],
        },
        ConfigField {
            key: "logging.format",
            value: format!("{:?}", logging.format),
            env_keys: &["GLIMMER_LOGGING_FORMAT", "GLIMMER_LOG_FORMAT"],
        },
        ConfigField {
            key: "recommendations.max_recommendations",
            value: recommendations.max_recommendations.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_MAX_RECOMMENDATIONS"],
        },
        ConfigField {
            key: "recommendations.content_candidates",
            value: recommendations.content_candidates.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_CONTENT_CANDIDATES"],
        },
        ConfigField {
            key: "recommendations.behavior_neighbors",
            value: recommendations.behavior_neighbors.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_BEHAVIOR_NEIGHBORS"],
        },
        ConfigField {
            key: "recommendations.also_bought_limit",
            value: recommendations.also_bought_limit.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_ALSO_BOUGHT_LIMIT"],
        },
        ConfigField {
            key: "recommendations.popular_limit",
            value: recommendations.popular_limit.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_POPULAR_LIMIT"],
        },
        ConfigField {
            key: "recommendations.max_features",
            value: recommendations.max_features.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_MAX_FEATURES"],
        },
        ConfigField {
            key: "recommendations.content_similarity",
            value: recommendations.content_similarity.to_string(),
            env_keys: &["GLIMMER_RECOMMENDATIONS_CONTENT_SIMILARITY"],
        },
    ]
}

fn overridden(options: &LoadOptions, key: &str) -> bool {
    let overrides = &options.overrides;
    match key {
        "database.url" => overrides.database_url.is_some(),
        "logging.level" => overrides.log_level.is_some(),
        "recommendations.content_similarity" => overrides.content_similarity.is_some(),
        _ => false,
    }
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &ConfigField,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
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
