pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use affinity_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use clap::{Parser, Subcommand};
use commands::insights::InsightQuery;

#[derive(Debug, Parser)]
#[command(
    name = "affinity",
    about = "Affinity operator CLI",
    long_about = "Inspect configuration, manage the record store, and query customer interest insights.",
    after_help = "Examples:\n  affinity doctor --json\n  affinity recommend kai@northwind.test --limit 3\n  affinity patterns --min-support 0.1"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an affinity.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the database URL")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override the per-call insight deadline in seconds")]
    deadline_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo snapshot and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, DB connectivity, record schema and snapshot reads")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Recommend purchase categories for a customer")]
    Recommend {
        email: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    #[command(about = "Mine frequent interest and interest/category itemsets")]
    Patterns {
        #[arg(long, help = "Minimum support in [0, 1]; defaults to insights.report_min_support")]
        min_support: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "List candidate marketing segments")]
    Segments,
    #[command(about = "Rank interests by connectedness to customers and categories")]
    Centrality {
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Build the combined insight report for a customer")]
    Report { email: String },
    #[command(about = "Summarize record counts, revenue and digest frequencies")]
    Summary,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                deadline_secs: self.deadline_secs,
                ..ConfigOverrides::default()
            },
        }
    }
}

/// Logs go to stderr; stdout carries the command output.
pub fn init_logging(config: &AppConfig) {
    use affinity_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded; keep it.
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
        Command::Recommend { email, limit } => {
            commands::insights::run(InsightQuery::Recommend { email, limit }, options)
        }
        Command::Patterns { min_support, limit } => {
            commands::insights::run(InsightQuery::Patterns { min_support, limit }, options)
        }
        Command::Segments => commands::insights::run(InsightQuery::Segments, options),
        Command::Centrality { limit } => {
            commands::insights::run(InsightQuery::Centrality { limit }, options)
        }
        Command::Report { email } => {
            commands::insights::run(InsightQuery::Report { email }, options)
        }
        Command::Summary => commands::insights::run(InsightQuery::Summary, options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
