use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::crypto::codec::SessionCodec;
use crate::error::Result;
use crate::services::session::SessionStore;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The encrypted session cookie store.
    pub sessions: SessionStore,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`. Fails if the cookie key cannot be derived.
    pub fn new(config: &Config) -> Result<Self> {
        let codec = SessionCodec::from_secret(&config.cookie_secret)?;
        tracing::info!("✅ Session codec initialized (AES-256-GCM)");

        let sessions = SessionStore::new(codec, config.cookie.clone());
        tracing::info!(
            "✅ Session store initialized (cookie: {}, secure: {})",
            config.cookie.name,
            config.cookie.secure
        );

        Ok(AppState {
            config: Arc::new(config.clone()),
            sessions,
        })
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
