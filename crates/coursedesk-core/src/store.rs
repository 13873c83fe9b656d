//! Token storage.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::tokens::{AccessToken, RefreshToken, TokenKind, TokenPair};

/// Durable storage for the session's token pair.
///
/// Implementations never fail across this interface: a storage fault is
/// logged and reads as an absent token. `clear` must be idempotent, since
/// both the session manager and the refresh path call it.
pub trait TokenStore: Send + Sync {
    /// Read one token.
    fn get(&self, kind: TokenKind) -> Option<String>;

    /// Store both tokens together.
    fn set(&self, pair: &TokenPair);

    /// Drop one token, leaving the other in place.
    fn remove(&self, kind: TokenKind);

    /// Drop both tokens.
    fn clear(&self);

    fn access_token(&self) -> Option<AccessToken> {
        self.get(TokenKind::Access).map(AccessToken::new)
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.get(TokenKind::Refresh).map(RefreshToken::new)
    }
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a token pair.
    pub fn with_tokens(pair: &TokenPair) -> Self {
        let store = Self::new();
        store.set(pair);
        store
    }

    /// Create a store holding only some tokens.
    pub fn with_entries(access: Option<&str>, refresh: Option<&str>) -> Self {
        let mut entries = HashMap::new();
        if let Some(access) = access {
            entries.insert(TokenKind::Access, access.to_string());
        }
        if let Some(refresh) = refresh {
            entries.insert(TokenKind::Refresh, refresh.to_string());
        }
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    fn set(&self, pair: &TokenPair) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(TokenKind::Access, pair.access.as_str().to_string());
        entries.insert(TokenKind::Refresh, pair.refresh.as_str().to_string());
    }

    fn remove(&self, kind: TokenKind) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&kind);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().is_none());

        store.set(&TokenPair::new("a", "r"));
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("a"));
        assert_eq!(store.refresh_token().unwrap().as_str(), "r");

        store.clear();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn remove_leaves_other_token() {
        let store = MemoryTokenStore::with_tokens(&TokenPair::new("a", "r"));
        store.remove(TokenKind::Access);
        assert!(store.access_token().is_none());
        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("r"));
    }
}
