use std::sync::Arc;

use crate::config::Config;
use crate::render::RenderSet;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Memory or Redis, chosen at startup from `REDIS_URL`.
    pub sessions: Arc<dyn SessionStore>,
    pub renderers: RenderSet,
    pub config: Config,
}
