//! Per-invocation wiring: token file, transport, session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tokio::sync::broadcast::{self, error::TryRecvError};

use coursedesk_file::FileTokenStore;
use coursedesk_http::{ApiClient, AuthEvent, ClientConfig, SessionManager};

use crate::output;

/// Everything a command needs.
pub struct AppContext {
    pub session: SessionManager,
    signals: broadcast::Receiver<AuthEvent>,
}

/// Location of the token document in the platform data directory.
pub fn token_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "coursedesk").context("Could not determine data directory")?;

    Ok(dirs.data_dir().join("tokens.json"))
}

impl AppContext {
    /// Build the session for the given API base over the on-disk token store.
    pub fn open(api_url: &str) -> Result<Self> {
        let config = ClientConfig::new(api_url).context("Invalid API URL")?;
        let path = token_path()?;
        tracing::debug!(path = %path.display(), "Using token store");

        let store = Arc::new(FileTokenStore::new(path));
        let client = ApiClient::new(config, store).context("Failed to build HTTP client")?;
        let session = SessionManager::new(client);
        let signals = session.events();

        Ok(Self { session, signals })
    }

    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }

    /// Forget signals raised so far, e.g. after a deliberate logout.
    pub fn discard_signals(&mut self) {
        while self.signals.try_recv().is_ok() {}
    }

    /// Tell the user to log in again if the session ended during the command.
    pub fn report_signals(&mut self) {
        let mut ended = false;
        loop {
            match self.signals.try_recv() {
                Ok(event) => {
                    tracing::debug!(?event, "Session signal");
                    ended = true;
                }
                Err(TryRecvError::Lagged(_)) => ended = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if ended {
            output::login_hint();
        }
    }
}
