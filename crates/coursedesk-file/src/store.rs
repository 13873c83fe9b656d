//! File-backed token store.
//!
//! Both tokens live in one small JSON document, keyed by their fixed storage
//! names. Writers serialize on an advisory lock file and replace the document
//! by renaming a freshly written temporary file, so a reader sees either the
//! old pair or the new pair, never a mix.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use coursedesk_core::{TokenKind, TokenPair, TokenStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl StoredTokens {
    fn slot(&mut self, kind: TokenKind) -> &mut Option<String> {
        match kind {
            TokenKind::Access => &mut self.access_token,
            TokenKind::Refresh => &mut self.refresh_token,
        }
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Token store persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file. Nothing is touched on disk
    /// until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the token document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the stored pair was last written, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.read().ok().and_then(|stored| stored.updated_at)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn read(&self) -> io::Result<StoredTokens> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoredTokens::default()),
            Err(e) => Err(e),
        }
    }

    fn lock(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    /// Read-modify-write under the lock.
    fn update(&self, apply: impl FnOnce(&mut StoredTokens)) -> io::Result<()> {
        let lock_file = self.lock()?;

        let result = self.read().and_then(|mut stored| {
            apply(&mut stored);
            self.commit(stored)
        });

        lock_file.unlock()?;
        result
    }

    /// Overwrite the document under the lock, whatever it held before.
    fn replace(&self, stored: StoredTokens) -> io::Result<()> {
        let lock_file = self.lock()?;
        let result = self.commit(stored);
        lock_file.unlock()?;
        result
    }

    fn commit(&self, mut stored: StoredTokens) -> io::Result<()> {
        if stored.is_empty() {
            self.remove_file()
        } else {
            stored.updated_at = Some(Utc::now());
            self.write_atomic(&stored)
        }
    }

    fn write_atomic(&self, stored: &StoredTokens) -> io::Result<()> {
        let tmp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let json = serde_json::to_vec_pretty(stored)?;
        let mut tmp = File::create(&tmp_path)?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        tmp.set_permissions(fs::Permissions::from_mode(0o600))?;

        tmp.write_all(&json)?;
        tmp.sync_data()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_path);
        })
    }

    fn remove_file(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        match self.read() {
            Ok(mut stored) => stored.slot(kind).take(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable token file, treating as empty");
                None
            }
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn set(&self, pair: &TokenPair) {
        let result = self.replace(StoredTokens {
            access_token: Some(pair.access.as_str().to_string()),
            refresh_token: Some(pair.refresh.as_str().to_string()),
            updated_at: None,
        });
        match result {
            Ok(()) => debug!("Stored token pair"),
            Err(e) => warn!(error = %e, "Failed to store token pair"),
        }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, kind: TokenKind) {
        if let Err(e) = self.update(|stored| *stored.slot(kind) = None) {
            warn!(error = %e, "Failed to remove token");
        }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) {
        let result = self.lock().and_then(|lock_file| {
            let removed = self.remove_file();
            lock_file.unlock()?;
            removed
        });
        match result {
            Ok(()) => debug!("Cleared stored tokens"),
            Err(e) => warn!(error = %e, "Failed to clear stored tokens"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileTokenStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileTokenStore::new(tmp.path().join("session").join("tokens.json"));
        (tmp, store)
    }

    #[test]
    fn test_empty_store_reads_nothing() {
        let (_tmp, store) = create_test_store();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(store.updated_at().is_none());
    }

    #[test]
    fn test_set_survives_reopen() {
        let (tmp, store) = create_test_store();
        store.set(&TokenPair::new("access-1", "refresh-1"));

        let reopened = FileTokenStore::new(tmp.path().join("session").join("tokens.json"));
        assert_eq!(reopened.access_token().unwrap().as_str(), "access-1");
        assert_eq!(reopened.refresh_token().unwrap().as_str(), "refresh-1");
        assert!(reopened.updated_at().is_some());
    }

    #[test]
    fn test_uses_fixed_key_names() {
        let (_tmp, store) = create_test_store();
        store.set(&TokenPair::new("a", "r"));

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(doc["access_token"], "a");
        assert_eq!(doc["refresh_token"], "r");
    }

    #[test]
    fn test_remove_access_keeps_refresh() {
        let (_tmp, store) = create_test_store();
        store.set(&TokenPair::new("a", "r"));

        store.remove(TokenKind::Access);
        assert!(store.access_token().is_none());
        assert_eq!(store.refresh_token().unwrap().as_str(), "r");

        store.remove(TokenKind::Refresh);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_tmp, store) = create_test_store();
        store.clear();

        store.set(&TokenPair::new("a", "r"));
        store.clear();
        store.clear();

        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let (_tmp, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{not json").unwrap();

        assert!(store.access_token().is_none());

        // A fresh pair replaces the corrupt document.
        store.clear();
        store.set(&TokenPair::new("a", "r"));
        assert_eq!(store.access_token().unwrap().as_str(), "a");
    }

    #[test]
    fn test_set_overwrites_corrupt_file() {
        let (_tmp, store) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{not json").unwrap();

        store.set(&TokenPair::new("a", "r"));

        assert_eq!(store.access_token().unwrap().as_str(), "a");
        assert_eq!(store.refresh_token().unwrap().as_str(), "r");
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private() {
        let (_tmp, store) = create_test_store();
        store.set(&TokenPair::new("a", "r"));

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
