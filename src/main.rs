//! # Precatório Search Server
//!
//! Binary entry point: loads configuration, wires the pipeline, storage and
//! HTTP layer together, and serves the REST API until interrupted.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use precatorio_search::api::{configure_routes, SearchHistory};
use precatorio_search::config::Config;
use precatorio_search::errors::Result;
use precatorio_search::pipeline::SearchPipeline;
use precatorio_search::storage::Storage;
use precatorio_search::AppState;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "precatorio-server",
    about = "Search and normalization service for Brazilian precatório court records"
)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Probe storage health and exit
    #[arg(long)]
    health_check: bool,
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);

    let storage = Arc::new(Storage::open(&config.storage.db_path)?);

    if args.health_check {
        storage.health_check()?;
        println!("storage ok ({} records)", storage.record_count());
        return Ok(());
    }

    let pipeline = Arc::new(SearchPipeline::from_config(&config)?);
    let history = Arc::new(SearchHistory::new(config.server.history_size));
    let enable_cors = config.server.enable_cors;
    let bind_addr = (config.server.host.clone(), config.server.port);

    let state = AppState {
        config: Arc::new(config),
        pipeline,
        storage,
        history,
    };

    tracing::info!("Starting server on {}:{}", bind_addr.0, bind_addr.1);

    let server = HttpServer::new(move || {
        let cors = if enable_cors {
            Cors::permissive()
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping server");
            handle.stop(true).await;
        }
    });

    server.await?;
    tracing::info!("Server stopped");

    Ok(())
}
