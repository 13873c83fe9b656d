//! coursedesk-http - Authenticated REST transport and session manager.
//!
//! [`ApiClient`] wraps `reqwest` with an outgoing interceptor that attaches
//! the stored access token and an incoming interceptor that renews an expired
//! session once and replays the request. [`SessionManager`] builds the
//! login/register/profile lifecycle on top of it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coursedesk_core::MemoryTokenStore;
//! use coursedesk_http::{ApiClient, ClientConfig, SessionManager};
//!
//! # async fn example() -> Result<(), coursedesk_core::Error> {
//! let config = ClientConfig::new("http://127.0.0.1:8000/api/")?;
//! let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))?;
//! let session = SessionManager::new(client);
//!
//! session.initialize().await;
//! if session.login("alice", "s3cret").await {
//!     println!("Logged in as {:?}", session.identity());
//! }
//! # Ok(())
//! # }
//! ```

mod catalog;
mod client;
mod config;
mod endpoints;
mod refresh;
mod session;

pub use client::{ApiClient, AuthEvent, PendingRequest};
pub use config::{ClientConfig, DEFAULT_API_URL, LOGIN_ROUTE};
pub use endpoints::{LOGIN, PROFILE, REFRESH, REGISTER};
pub use session::{SessionManager, SessionStatus};
