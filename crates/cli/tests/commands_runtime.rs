use std::env;
use std::sync::{Mutex, OnceLock};

use glimmer_cli::commands::{also_bought, config, migrate, recommend, seed, show};
use glimmer_core::config::LoadOptions;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_on_fresh_database() {
    with_database(|options| {
        let result = migrate::run(options);
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn invalid_env_override_is_a_config_failure() {
    with_env(&[("GLIMMER_RECOMMENDATIONS_POPULAR_LIMIT", "many")], || {
        let result = migrate::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_database(|options| {
        let first = seed::run(options);
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let second = seed::run(options);
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["status"], "ok");
        assert_eq!(first_payload["message"], second_payload["message"]);
        assert!(first_payload["message"].as_str().unwrap_or("").contains("12 products"));
    });
}

#[test]
fn jobs_skip_on_an_empty_database() {
    with_database(|options| {
        let recommended = recommend::run(options);
        let also = also_bought::run(options);

        assert_eq!(recommended.exit_code, 0);
        assert_eq!(also.exit_code, 0);
        assert_eq!(parse_payload(&recommended.output)["status"], "skipped");
        assert_eq!(parse_payload(&also.output)["status"], "skipped");
    });
}

#[test]
fn jobs_complete_on_the_demo_catalog() {
    with_database(|options| {
        assert_eq!(seed::run(options).exit_code, 0);

        let recommended = recommend::run(options);
        let payload = parse_payload(&recommended.output);
        assert_eq!(recommended.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("recommendations completed: 12 products"), "{message}");

        let also = also_bought::run(options);
        let payload = parse_payload(&also.output);
        assert_eq!(payload["status"], "ok");
        assert!(payload["message"].as_str().unwrap_or("").contains("order baskets"));
    });
}

#[test]
fn show_resolves_stored_lists_to_names() {
    with_database(|options| {
        assert_eq!(seed::run(options).exit_code, 0);
        assert_eq!(also_bought::run(options).exit_code, 0);

        let result = show::run(options, 4);
        let payload = parse_payload(&result.output);
        assert_eq!(result.exit_code, 0);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("Chandbali Jhumka (#4)"), "{message}");
        assert!(message.contains(
            "also bought: Kundan Rani Haar (#1), Polki Choker (#3), Pearl Drop Jhumka (#5), Kundan Bangle Pair (#8)"
        ));
        assert!(message.contains("recommended: <none>"));
    });
}

#[test]
fn show_rejects_unknown_products() {
    with_database(|options| {
        let result = show::run(options, 999);
        let payload = parse_payload(&result.output);

        assert_eq!(result.exit_code, 6);
        assert_eq!(payload["error_class"], "invalid_argument");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("GLIMMER_RECOMMENDATIONS_BEHAVIOR_NEIGHBORS", "12")], || {
        let result = config::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains(
            "- recommendations.behavior_neighbors = 12 (source: env (GLIMMER_RECOMMENDATIONS_BEHAVIOR_NEIGHBORS))"
        ));
        assert!(message.contains("- recommendations.popular_limit = 50 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

/// Runs against a fresh SQLite file; in-memory databases do not survive
/// between the separate pools each command opens.
fn with_database(test_fn: impl FnOnce(&LoadOptions)) {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("glimmer.db").display());

    with_env(&[("GLIMMER_DATABASE_URL", url.as_str())], || {
        test_fn(&LoadOptions::default());
    });
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GLIMMER_DATABASE_URL",
        "GLIMMER_DATABASE_MAX_CONNECTIONS",
        "GLIMMER_DATABASE_TIMEOUT_SECS",
        "GLIMMER_LOGGING_LEVEL",
        "GLIMMER_LOGGING_FORMAT",
        "GLIMMER_LOG_LEVEL",
        "GLIMMER_LOG_FORMAT",
        "GLIMMER_RECOMMENDATIONS_MAX_RECOMMENDATIONS",
        "GLIMMER_RECOMMENDATIONS_CONTENT_CANDIDATES",
        "GLIMMER_RECOMMENDATIONS_BEHAVIOR_NEIGHBORS",
        "GLIMMER_RECOMMENDATIONS_ALSO_BOUGHT_LIMIT",
        "GLIMMER_RECOMMENDATIONS_POPULAR_LIMIT",
        "GLIMMER_RECOMMENDATIONS_MAX_FEATURES",
        "GLIMMER_RECOMMENDATIONS_CONTENT_SIMILARITY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
