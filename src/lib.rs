pub mod api;
pub mod cli;
pub mod config;
pub mod flows;
pub mod guard;
pub mod models;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::ApiClient;
pub use session::SessionStore;

use anyhow::Result;
use config::Config;
use std::sync::Arc;
use tracing::debug;

use crate::api::{HttpTransport, Transport};
use crate::session::{FileStorage, SessionStorage};

/// Shared handles every front end needs: the restored session and a
/// client bound to it.
#[derive(Debug, Clone)]
pub struct App {
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
}

impl App {
    /// Restore the session from `storage` and bind a client to it
    pub fn new(transport: Arc<dyn Transport>, storage: impl SessionStorage + 'static) -> Self {
        let session = Arc::new(SessionStore::restored(storage));
        let api = ApiClient::new(transport, session.clone());
        Self { session, api }
    }

    /// HTTP transport and file-backed session, as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.api.base_url, config.api.timeout())?;
        let path = config.session.path();
        debug!(base_url = %config.api.base_url, session_file = %path.display(), "Opening client");
        Ok(Self::new(Arc::new(transport), FileStorage::new(path)))
    }
}
