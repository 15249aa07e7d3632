//! Review Pulse - review analytics dashboard backend
//!
//! Serves the stage/step/node content tree, the selection state machine and a
//! simulated streaming report conversation over HTTP and SSE.

mod api;
mod assistant;
mod config;
mod content;
mod report;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use assistant::{CannedAssistant, LoggingAssistant};
use config::AppConfig;
use content::ContentProvider;
use runtime::{start_session, RuntimeConfig};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_pulse=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Load content
    let provider: Box<dyn ContentProvider> =
        content::provider_from_config(config.content_path.as_ref());
    let tree = provider.load()?;
    tracing::info!(
        source = %provider.describe(),
        stages = tree.stages().len(),
        "Content loaded"
    );

    let initial_stage = config.default_stage.resolve(&tree);

    let assistant = LoggingAssistant::new(CannedAssistant::new(config.tag_delay));
    let session = start_session(
        tree,
        initial_stage,
        assistant,
        RuntimeConfig {
            reveal_delay: config.reveal_delay,
        },
    );

    let state = AppState::new(session, report::june_2024());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Review Pulse server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
