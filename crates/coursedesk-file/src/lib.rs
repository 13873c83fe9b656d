//! coursedesk-file - File-backed token storage.

mod store;

pub use store::FileTokenStore;
