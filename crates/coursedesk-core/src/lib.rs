//! coursedesk-core - Core session, token and catalog types.

pub mod catalog;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod store;
pub mod tokens;

pub use catalog::{Category, CategoryDraft, Course, CourseDraft, ListPayload, Resource};
pub use credentials::{Credentials, Registration};
pub use error::Error;
pub use identity::{Claims, Identity, ProfileUpdate};
pub use store::{MemoryTokenStore, TokenStore};
pub use tokens::{AccessToken, RefreshToken, TokenKind, TokenPair};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
