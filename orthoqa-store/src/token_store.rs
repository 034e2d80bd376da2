//! Bearer token storage.
//!
//! The system keychain is the preferred home for the session token. Where
//! it is unavailable (headless Linux, locked keychains, CI) the token falls
//! back to an owner-only JSON file next to the settings.

use async_trait::async_trait;
use orthoqa_fetch::{KeychainTokenStore, TokenProvider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_token_path, load_json, remove_file, save_json};
use crate::settings::TokenBackend;

// ============================================================================
// File Token Store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    token: Option<String>,
}

/// Session token kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store backed by the default token path.
    pub fn at_default_path() -> Self {
        Self::new(default_token_path())
    }

    /// Path of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored token. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn get(&self) -> Result<Option<String>, StoreError> {
        match load_json::<TokenFile>(&self.path).await {
            Ok(file) => Ok(file.token.filter(|t| !t.is_empty())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn set(&self, token: &str) -> Result<(), StoreError> {
        let file = TokenFile {
            token: Some(token.to_string()),
        };
        save_json(&self.path, &file).await?;
        debug!(path = %self.path.display(), "Token stored in file");
        Ok(())
    }

    /// Removes the token file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), StoreError> {
        remove_file(&self.path).await
    }
}

#[async_trait]
impl TokenProvider for FileTokenStore {
    async fn auth_token(&self) -> Option<String> {
        match self.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Token file unreadable, continuing without token");
                None
            }
        }
    }
}

// ============================================================================
// Chained Token Provider
// ============================================================================

/// Keychain-first token lookup with a file fallback.
#[derive(Debug, Clone)]
pub struct ChainedTokenProvider {
    backend: TokenBackend,
    keychain: KeychainTokenStore,
    file: FileTokenStore,
}

impl ChainedTokenProvider {
    /// Chain over explicit stores.
    pub fn new(backend: TokenBackend, keychain: KeychainTokenStore, file: FileTokenStore) -> Self {
        Self {
            backend,
            keychain,
            file,
        }
    }

    /// Chain over the default keychain entry and token file.
    pub fn from_backend(backend: TokenBackend) -> Self {
        Self::new(backend, KeychainTokenStore::new(), FileTokenStore::at_default_path())
    }

    /// Configured backend.
    pub fn backend(&self) -> TokenBackend {
        self.backend
    }

    /// Stores `token` and returns where it ended up.
    ///
    /// With [`TokenBackend::Auto`] a keychain failure falls back to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if no configured backend accepts the token.
    pub async fn set(&self, token: &str) -> Result<TokenBackend, StoreError> {
        match self.backend {
            TokenBackend::Keychain => {
                self.keychain.set(token)?;
                Ok(TokenBackend::Keychain)
            }
            TokenBackend::File => {
                self.file.set(token).await?;
                Ok(TokenBackend::File)
            }
            TokenBackend::Auto => match self.keychain.set(token) {
                Ok(()) => {
                    // Drop any fallback token left over from a keychain outage.
                    self.file.clear().await?;
                    Ok(TokenBackend::Keychain)
                }
                Err(e) => {
                    warn!(error = %e, "Keychain unavailable, storing token in file");
                    self.file.set(token).await?;
                    Ok(TokenBackend::File)
                }
            },
        }
    }

    /// Removes the token from every configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured backend cannot be cleared.
    pub async fn clear(&self) -> Result<(), StoreError> {
        match self.backend {
            TokenBackend::Keychain => self.keychain.clear()?,
            TokenBackend::File => self.file.clear().await?,
            TokenBackend::Auto => {
                if let Err(e) = self.keychain.clear() {
                    warn!(error = %e, "Failed to clear keychain token");
                }
                self.file.clear().await?;
            }
        }
        info!(backend = %self.backend, "Token cleared");
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for ChainedTokenProvider {
    async fn auth_token(&self) -> Option<String> {
        match self.backend {
            TokenBackend::Keychain => self.keychain.auth_token().await,
            TokenBackend::File => self.file.auth_token().await,
            TokenBackend::Auto => match self.keychain.auth_token().await {
                Some(token) => Some(token),
                None => self.file.auth_token().await,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_store(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(dir.path().join("token.json"))
    }

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);

        assert_eq!(store.get().await.unwrap(), None);

        store.set("abc123").await.unwrap();
        assert_eq!(store.get().await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(store.auth_token().await.as_deref(), Some("abc123"));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_token_file_means_no_token() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        tokio::fs::write(store.path(), "not json").await.unwrap();

        assert!(store.get().await.is_err());
        assert_eq!(store.auth_token().await, None);
    }

    #[tokio::test]
    async fn test_empty_token_is_none() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        tokio::fs::write(store.path(), r#"{"token": ""}"#).await.unwrap();

        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_chain_with_file_backend() {
        let dir = TempDir::new().unwrap();
        let chain = ChainedTokenProvider::new(
            TokenBackend::File,
            KeychainTokenStore::with_names("orthoqa-test", "unused"),
            file_store(&dir),
        );

        assert_eq!(chain.set("s3cret").await.unwrap(), TokenBackend::File);
        assert_eq!(chain.auth_token().await.as_deref(), Some("s3cret"));

        chain.clear().await.unwrap();
        assert_eq!(chain.auth_token().await, None);
    }

    // The keychain and auto backends need platform keychain access and are
    // left to manual testing.
}
