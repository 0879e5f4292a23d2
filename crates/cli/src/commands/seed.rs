use glimmer_core::config::LoadOptions;
use glimmer_db::{DemoCatalog, SeedResult};

use crate::commands::{build_runtime, load_config, open_database, CommandResult, Failure};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        let seeded = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let outcome: Result<SeedResult, Failure> = if verification.all_present {
            Ok(seeded)
        } else {
            let failed: Vec<&str> = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect();
            Err(("seed_verification", verification_message(&failed), 6u8))
        };

        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", seed_message(&seeded)),
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn seed_message(seeded: &SeedResult) -> String {
    format!(
        "demo catalog loaded: {} parent categories, {} categories, {} products, {} interaction events",
        seeded.parent_categories, seeded.categories, seeded.products, seeded.events
    )
}

fn verification_message(failed: &[&str]) -> String {
    if failed.is_empty() {
        "some demo data failed to load".to_string()
    } else {
        format!("demo data verification failed for checks: {}", failed.join(", "))
    }
}
