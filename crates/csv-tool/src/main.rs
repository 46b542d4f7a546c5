use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::csv_io;
use domain::store::{Aggregation, Store};
use infrastructure::PostgresStore;

mod config;
use config::ToolConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file (`spec.md` §6 CLI entry point).
    config: String,

    /// Raise the logging verbosity to debug regardless of `logging.level`.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a pivot CSV (`Datetime,<id>,<id>,...`) from a file.
    Import { csv_path: PathBuf },
    /// Export a raw range as pivot CSV to stdout, or to `--output` if given.
    Export {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        /// Comma-separated timeseries ids.
        ids: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export a bucketed/aggregated range as pivot CSV.
    ExportAggregate {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ids: String,
        #[arg(long, default_value = "3600")]
        bucket_width_secs: i64,
        #[arg(long, default_value = "UTC")]
        timezone: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ToolConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {e}", args.config);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, args.verbose);

    match run(config, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "csv-tool failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &ToolConfig, verbose: bool) {
    if !config.logging.enabled {
        return;
    }
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "{level},csv_tool={level}"
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn parse_ids(raw: &str) -> anyhow::Result<Vec<i64>> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| Ok(s.trim().parse::<i64>()?))
        .collect()
}

async fn run(config: ToolConfig, command: Command) -> anyhow::Result<()> {
    let pool = sqlx::PgPool::connect(&config.db_url).await?;
    let store = PostgresStore::new(pool);
    store.setup().await?;

    match command {
        Command::Import { csv_path } => {
            let body = std::fs::read_to_string(&csv_path)?;
            let inserted = csv_io::import_csv(&store, &body).await?;
            info!(inserted, path = %csv_path.display(), "import complete");
        }
        Command::Export { start, end, ids, output } => {
            let ids = parse_ids(&ids)?;
            let csv = csv_io::export_csv(&store, start, end, &ids).await?;
            write_output(output, &csv)?;
        }
        Command::ExportAggregate {
            start,
            end,
            ids,
            bucket_width_secs,
            timezone,
            output,
        } => {
            let ids = parse_ids(&ids)?;
            let tz: chrono_tz::Tz = timezone
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown timezone: {timezone}"))?;
            let csv = csv_io::export_csv_bucket(
                &store,
                start,
                end,
                &ids,
                Duration::seconds(bucket_width_secs),
                tz,
                Aggregation::Avg,
            )
            .await?;
            write_output(output, &csv)?;
        }
    }

    Ok(())
}

fn write_output(output: Option<PathBuf>, csv: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(&path, csv)?,
        None => print!("{csv}"),
    }
    Ok(())
}
