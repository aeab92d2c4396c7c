use std::sync::Arc;

use bazar_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub settings: Settings,
    pub mailer: Mailer,
}

/// Runtime knobs handed over by the server binary.
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt_secret: String,
    /// Lifetime of access tokens. Claims are a snapshot, so this also bounds
    /// how long a role change takes to reach a logged-in user.
    pub token_ttl: chrono::Duration,
    /// Base URL of the web client, used to build password reset links.
    pub frontend_url: String,
    /// Answer an empty product search with 404 instead of an empty list.
    pub empty_search_not_found: bool,
}

impl AppStateInner {
    pub fn new(db: Database, settings: Settings, mailer: Mailer) -> AppState {
        Arc::new(Self {
            db,
            settings,
            mailer,
        })
    }
}

/// Run blocking store work off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}
