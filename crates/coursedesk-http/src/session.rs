//! Session lifecycle: startup check, login, registration, profile, logout.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use coursedesk_core::error::AuthError;
use coursedesk_core::{
    Credentials, Identity, ProfileUpdate, Registration, Result, TokenKind, TokenPair, TokenStore,
};

use crate::client::{ApiClient, AuthEvent};
use crate::endpoints::{LOGIN, PROFILE, REGISTER};

/// Where the session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// `initialize` has not run yet.
    Uninitialized,
    /// The startup check is in progress.
    Initializing,
    Authenticated(Identity),
    Anonymous,
}

impl SessionStatus {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionStatus::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// True only while the startup check runs.
    pub fn is_initializing(&self) -> bool {
        matches!(self, SessionStatus::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }
}

/// The authenticated session, shared by reference with every consumer.
///
/// Public operations never return errors: failures are logged and reported
/// as `false` or `None`, and the session falls back to a consistent state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    state: watch::Sender<SessionStatus>,
}

impl SessionManager {
    /// Wrap a client. The session drops to `Anonymous` whenever the client
    /// reports that the server ended it.
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionStatus::Uninitialized);
        let inner = Arc::new(SessionInner { client, state });

        let session = Arc::downgrade(&inner);
        inner.client.on_event(move |event| {
            if event == AuthEvent::SessionExpired
                && let Some(session) = session.upgrade()
            {
                session.state.send_if_modified(|status| {
                    if status.is_authenticated() {
                        info!("Session expired on the server");
                        *status = SessionStatus::Anonymous;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Self { inner }
    }

    /// The transport this session drives.
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    fn store(&self) -> &Arc<dyn TokenStore> {
        self.inner.client.store()
    }

    fn set_status(&self, status: SessionStatus) {
        self.inner.state.send_replace(status);
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity().cloned()
    }

    pub fn is_initializing(&self) -> bool {
        self.inner.state.borrow().is_initializing()
    }

    /// Watch status changes.
    pub fn watch(&self) -> watch::Receiver<SessionStatus> {
        self.inner.state.subscribe()
    }

    /// Subscribe to session-ending signals from the session and transport.
    pub fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.client.subscribe()
    }

    /// Restore the session from stored tokens.
    ///
    /// Runs once; later calls return the current status untouched.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> SessionStatus {
        let started = self.inner.state.send_if_modified(|status| {
            if *status == SessionStatus::Uninitialized {
                *status = SessionStatus::Initializing;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("Session already initialized");
            return self.status();
        }

        let status = match self.restore().await {
            Some(identity) => {
                info!(user = %identity.username, "Restored session");
                SessionStatus::Authenticated(identity)
            }
            None => SessionStatus::Anonymous,
        };

        self.set_status(status.clone());
        status
    }

    async fn restore(&self) -> Option<Identity> {
        let access = self.store().access_token()?;

        match Identity::from_access_token(&access) {
            Ok(identity) => return Some(identity),
            Err(e) => warn!(error = %e, "Stored access token is unreadable, discarding it"),
        }

        self.store().remove(TokenKind::Access);
        if self.store().refresh_token().is_none() {
            return None;
        }

        match self.inner.client.refresh().await {
            Ok(pair) => Identity::from_access_token(&pair.access)
                .inspect_err(|e| warn!(error = %e, "Refreshed access token is unreadable"))
                .ok(),
            Err(e) => {
                warn!(error = %e, "Background refresh failed");
                self.store().remove(TokenKind::Refresh);
                None
            }
        }
    }

    /// Log in and establish a session. Returns whether it worked.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> bool {
        self.login_with(&Credentials::new(username, password)).await
    }

    /// Log in with prepared credentials.
    pub async fn login_with(&self, credentials: &Credentials) -> bool {
        self.try_login(credentials).await.is_ok()
    }

    /// Log in and report why it failed.
    ///
    /// A 401 from the login endpoint becomes [`AuthError::InvalidCredentials`];
    /// an access token without a readable identity becomes
    /// [`AuthError::UnreadableIdentity`]. Any failure clears stored tokens.
    #[instrument(skip_all, fields(username = %credentials.username()))]
    pub async fn try_login(&self, credentials: &Credentials) -> Result<Identity> {
        let reply = self.inner.client.post::<_, TokenPair>(LOGIN, credentials).await;
        let result: Result<Identity> = match reply {
            Ok(pair) => {
                self.store().set(&pair);
                Identity::from_access_token(&pair.access).map_err(|e| {
                    AuthError::UnreadableIdentity {
                        reason: e.to_string(),
                    }
                    .into()
                })
            }
            Err(e) if e.is_unauthorized() => Err(AuthError::InvalidCredentials.into()),
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => {
                info!(user_id = identity.id, "Logged in");
                self.set_status(SessionStatus::Authenticated(identity.clone()));
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.store().clear();
                self.set_status(SessionStatus::Anonymous);
                Err(e)
            }
        }
    }

    /// Create an account, then log in with it.
    ///
    /// Reports the login outcome: a created account that cannot log in is a
    /// failure.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> bool {
        if let Err(e) = self
            .inner
            .client
            .post::<_, serde_json::Value>(REGISTER, registration)
            .await
        {
            warn!(error = %e, "Registration failed");
            return false;
        }

        info!("Account created, logging in");
        self.login_with(&registration.credentials()).await
    }

    /// Drop the session and signal the login screen. Safe to call repeatedly.
    pub fn logout(&self) {
        self.store().clear();
        self.set_status(SessionStatus::Anonymous);
        self.inner.client.emit(AuthEvent::LoggedOut);
        info!("Logged out");
    }

    /// Load the server's full profile and make it the session identity.
    ///
    /// A failure is treated as an invalid session and logs out.
    #[instrument(skip(self))]
    pub async fn get_user_profile(&self) -> Option<Identity> {
        match self.inner.client.get::<Identity>(PROFILE).await {
            Ok(identity) => {
                self.set_status(SessionStatus::Authenticated(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load user profile");
                self.logout();
                None
            }
        }
    }

    /// Submit changed profile fields; on success the reply becomes the
    /// session identity.
    #[instrument(skip(self))]
    pub async fn update_user_profile(&self, update: &ProfileUpdate) -> bool {
        match self.inner.client.put::<_, Identity>(PROFILE, update).await {
            Ok(identity) => {
                self.set_status(SessionStatus::Authenticated(identity));
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to update profile");
                false
            }
        }
    }

    /// Renew the token pair now and re-derive the identity from it.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        let pair = match self.inner.client.refresh().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.set_status(SessionStatus::Anonymous);
                return false;
            }
        };

        match Identity::from_access_token(&pair.access) {
            Ok(identity) => {
                self.set_status(SessionStatus::Authenticated(identity));
                true
            }
            Err(e) => {
                warn!(error = %e, "Refreshed access token is unreadable");
                false
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &*self.inner.state.borrow())
            .field("client", &self.inner.client)
            .finish()
    }
}
