use glimmer_core::config::LoadOptions;
use glimmer_db::repositories::{
    SqlCatalogRepository, SqlInteractionRepository, SqlRecommendationRepository,
};
use glimmer_db::{AlsoBoughtJob, JobReport};

use crate::commands::{
    build_runtime, job_failure, load_config, open_database, CommandResult, Failure,
};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("also-bought", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("also-bought") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result: Result<JobReport, Failure> = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let catalog = SqlCatalogRepository::new(pool.clone());
        let interactions = SqlInteractionRepository::new(pool.clone());
        let recommendations = SqlRecommendationRepository::new(pool.clone());

        let job = AlsoBoughtJob::new(
            &catalog,
            &interactions,
            &recommendations,
            config.recommendations.settings(),
        );
        let report = job.run().await.map_err(job_failure);
        pool.close().await;
        report
    });

    match result {
        Ok(report) if report.is_aborted() => {
            CommandResult::skipped("also-bought", report.summary())
        }
        Ok(report) => CommandResult::success("also-bought", report.summary()),
        Err(failure) => CommandResult::from_failure("also-bought", failure),
    }
}
