mod config;
mod errors;
mod matching;
mod nlp;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::matching::MatchPipeline;
use crate::nlp::{LexiconAnalyzer, LinguisticAnalyzer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume matcher v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the analysis provider once; every request shares it
    let analyzer_config = config.analyzer_config()?;
    if analyzer_config.model.is_none() {
        warn!("No embedding model configured; similarity uses hashed trigram vectors");
    }
    let analyzer: Arc<dyn LinguisticAnalyzer> = Arc::new(LexiconAnalyzer::load(&analyzer_config)?);
    info!("Analyzer initialized (backend: {})", analyzer.backend());

    let pipeline = MatchPipeline::new(analyzer, config.match_settings());
    let settings = pipeline.settings();
    info!(
        "Required experience: {} years (infer from job description: {})",
        settings.required_experience.fixed_years,
        settings.required_experience.infer_from_job_description
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        pipeline,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
