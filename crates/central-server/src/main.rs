use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use central_server::{api, config::ServerConfig, state::AppState};

use application::acquisition::Service;
use application::decoders::DecoderRegistry;
use infrastructure::{PostgresStore, SeaOrmAcquisitionRepository, SeaOrmEventRepository};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file (`spec.md` §6 CLI entry point).
    config: String,

    /// Raise the logging verbosity to debug regardless of `logging.level`.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ServerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {e}", args.config);
            return ExitCode::FAILURE;
        }
    };

    let _file_guard = init_logging(&config, args.verbose);

    info!("central-server starting up");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "central-server failed to start");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(
    config: &central_server::config::ServerConfig,
    verbose: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if !config.logging.enabled {
        return None;
    }

    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::new(format!("{level},central_server={level}"));

    match &config.logging.dirpath {
        Some(dirpath) => {
            let rotation = tracing_appender::rolling::daily(dirpath, "central-server.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(rotation);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        }
    }
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    info!("connecting to database");
    let db = Database::connect(&config.db_url).await?;
    Migrator::up(&db, None).await?;

    let pg_pool = sqlx::PgPool::connect(&config.db_url).await?;
    let store: Arc<dyn domain::store::Store> = Arc::new(PostgresStore::new(pg_pool));
    store.setup().await?;

    let acquisition_repository: Arc<dyn domain::acquisition_repository::AcquisitionRepository> =
        Arc::new(SeaOrmAcquisitionRepository::new(db.clone()));
    let event_repository: Arc<dyn domain::event_repository::EventRepository> =
        Arc::new(SeaOrmEventRepository::new(db.clone()));

    let mut service = Service::new(
        acquisition_repository,
        store.clone(),
        DecoderRegistry::with_builtins(),
        PathBuf::from(&config.working_dirpath),
    );
    service.run(&config.mqtt_client_id).await?;
    info!("acquisition engine running");

    let app_state = Arc::new(AppState::new(store, event_repository, db));
    let router = api::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    info!(port = config.api_port, "HTTP API listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    server.await?;

    service.stop().await;
    info!("central-server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
