use crate::config::Config;
use crate::matching::MatchPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Holds the process-wide analyzer; cloning only bumps its `Arc`.
    pub pipeline: MatchPipeline,
}
