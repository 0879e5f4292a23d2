pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use glimmer_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "glimmer",
    about = "Glimmer recommendation jobs CLI",
    long_about = "Recompute and inspect product recommendation lists for the jewelry rental catalog.",
    after_help = "Examples:\n  glimmer migrate\n  glimmer recommend\n  glimmer also-bought\n  glimmer show --product 4"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "Config file to load instead of ./glimmer.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog and interaction log")]
    Seed,
    #[command(about = "Recompute every product's recommended list")]
    Recommend {
        #[arg(long, help = "Skip text similarity and rank by behavior and popularity only")]
        no_content: bool,
    },
    #[command(about = "Recompute every product's also-bought list from shared orders")]
    AlsoBought,
    #[command(about = "Show the stored lists for one product")]
    Show {
        #[arg(long, help = "Product id")]
        product: i64,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        let content_similarity = match self.command {
            Command::Recommend { no_content: true } => Some(false),
            _ => None,
        };
        LoadOptions {
            require_file: self.global.config.is_some(),
            config_path: self.global.config.clone(),
            overrides: ConfigOverrides {
                database_url: self.global.database_url.clone(),
                log_level: self.global.log_level.clone(),
                content_similarity,
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Commands report config errors themselves; logging just stays off.
    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Recommend { .. } => commands::recommend::run(&options),
        Command::AlsoBought => commands::also_bought::run(&options),
        Command::Show { product } => commands::show::run(&options, product),
        Command::Config => commands::config::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
