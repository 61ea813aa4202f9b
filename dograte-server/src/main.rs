//! Binary entry point for the dograte HTTP server.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use dograte_core::seed::BreedSeeder;
use dograte_server::{
    create_app,
    infra::{
        config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings},
        startup::{
            ProdStartupHooks, ResourceBootstrap, StartupHooks, StoreBackend, connect_mongo,
            wire_app_resources,
        },
    },
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "dograte-server")]
#[command(about = "Dog photo rating backend over MongoDB")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, env = "DOGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Serve from the in-memory store instead of MongoDB
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store every breed and photo from the dog image API, then exit
    Seed,
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Create the MongoDB indexes and exit
    Indexes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Command::Seed => {
                run_seed(&cli.serve).await?;
                return Ok(());
            }
            Command::Db(DbCommand::Indexes) => {
                run_db_indexes(&cli.serve).await?;
                return Ok(());
            }
        }
    }

    run_server(cli.serve).await
}

async fn run_seed(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let ResourceBootstrap { state, mongo } =
        wire_app_resources(config, StoreBackend::Mongo).await?;
    if let Some(database) = &mongo {
        database
            .ensure_indexes()
            .await
            .context("failed to create MongoDB indexes")?;
    }

    let seeder = BreedSeeder::new(state.repos.dogs.clone(), state.images.clone());
    let report = seeder
        .store_all_breeds()
        .await
        .context("seeding breeds failed")?;
    info!(
        breeds = report.breeds,
        sub_breeds = report.sub_breeds,
        urls = report.urls,
        "Seeding finished"
    );
    Ok(())
}

async fn run_db_indexes(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let database = connect_mongo(&config).await?;
    database
        .ensure_indexes()
        .await
        .context("failed to create MongoDB indexes")?;
    info!(database = %config.database.name, "MongoDB indexes in place");
    Ok(())
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(&args)?;
    let backend = if args.in_memory {
        StoreBackend::InMemory
    } else {
        StoreBackend::Mongo
    };

    let ResourceBootstrap { state, mongo } = wire_app_resources(config.clone(), backend).await?;
    ProdStartupHooks
        .run(&state, mongo.as_ref())
        .await
        .context("startup hooks failed")?;

    let app = create_app(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        address = %listener.local_addr().context("listener has no local address")?,
        dev_mode = config.dev_mode,
        "dograte server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Arc<Config>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    apply_cli_overrides(&mut config, args);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "loaded config file");
    }
    log_config_warnings(&warnings);

    info!(
        database = %config.database.name,
        dog_api = %config.dog_api.base_url,
        "configuration in effect"
    );

    Ok(Arc::new(config))
}

fn apply_cli_overrides(config: &mut Config, args: &ServeArgs) {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }
}

fn log_config_warnings(warnings: &ConfigWarnings) {
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
