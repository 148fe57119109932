//! marquee-planner - event plan generation service
//!
//! Serves `/api/plan` and `/api/chat` over HTTP, or runs a single plan from
//! the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marquee_common::config::{load_config, TomlConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use marquee_planner::api::{PlanResponse, ServiceStatus};
use marquee_planner::config::ApiKeys;
use marquee_planner::models::{Constraints, PlanRequest, TransportMode};
use marquee_planner::services::{
    GoogleDirectionsClient, GooglePlacesClient, OpenAiClient, PlanOrchestrator, PlanSummarizer,
};
use marquee_planner::AppState;

/// Command-line arguments for marquee-planner
#[derive(Parser, Debug)]
#[command(name = "marquee-planner")]
#[command(about = "Event plan generation and verification service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "MARQUEE_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind (overrides config)
    #[arg(long, env = "MARQUEE_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "MARQUEE_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Plan once and print the result as JSON
    Plan {
        query: String,
        /// WALKING, DRIVING, TRANSIT or BICYCLING
        #[arg(short, long, default_value = "transit")]
        mode: TransportMode,
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Spending ceiling in dollars
        #[arg(long)]
        budget: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // RUST_LOG wins over the configured level
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        filter_handle
            .reload(EnvFilter::new(format!("{},tower_http=info", config.logging.level)))
            .context("Failed to apply configured log level")?;
    }

    info!(
        "Starting marquee-planner v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let keys = ApiKeys::resolve(&config);
    let (orchestrator, summarizer) = build_services(&config, &keys)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, keys, orchestrator, summarizer).await,
        Command::Plan {
            query,
            mode,
            max_iterations,
            budget,
        } => {
            let mut request = PlanRequest::new(query, mode).with_constraints(Constraints {
                budget,
                ..Default::default()
            });
            request.max_iterations = max_iterations;

            let outcome = orchestrator.run(request).await.context("Planning failed")?;
            let payload = serde_json::to_string_pretty(&PlanResponse::from(outcome))?;
            println!("{}", payload);
            Ok(())
        }
    }
}

fn build_services(config: &TomlConfig, keys: &ApiKeys) -> Result<(Arc<PlanOrchestrator>, PlanSummarizer)> {
    let llm = Arc::new(
        OpenAiClient::new(&config.openai, keys.openai.clone()).context("Failed to create OpenAI client")?,
    );
    let places = Arc::new(
        GooglePlacesClient::new(&config.google, keys.google_places.clone())
            .context("Failed to create Places client")?,
    );
    let directions = Arc::new(
        GoogleDirectionsClient::new(&config.google, keys.google_maps.clone())
            .context("Failed to create Directions client")?,
    );

    let orchestrator = PlanOrchestrator::from_config(llm.clone(), places, directions, &config.planner);
    Ok((Arc::new(orchestrator), PlanSummarizer::new(llm)))
}

async fn serve(
    config: TomlConfig,
    keys: ApiKeys,
    orchestrator: Arc<PlanOrchestrator>,
    summarizer: PlanSummarizer,
) -> Result<()> {
    let status = ServiceStatus::new(&config, &keys);
    let state = AppState::new(orchestrator, summarizer, status);
    let app = marquee_planner::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
