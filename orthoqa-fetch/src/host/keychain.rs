//! Bearer token storage in the system keychain.
//!
//! This is the "native secure storage" the token lookup tries first:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! ## Caching
//!
//! Platform keychain calls are blocking and may wait on an unlock prompt.
//! [`TokenProvider::auth_token`] runs them on the blocking pool and remembers
//! the answer (including "no token") so later requests skip the keychain.
//! [`KeychainTokenStore::set`] and [`KeychainTokenStore::clear`] keep the
//! remembered value in step with what they wrote.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, trace, warn};

use crate::auth::TokenProvider;
use crate::error::KeychainError;
use crate::lock;

/// Keychain service name for `OrthoQA` credentials.
pub const SERVICE: &str = "orthoqa";

/// Account name the session token is stored under.
pub const TOKEN_ACCOUNT: &str = "auth_token";

// ============================================================================
// Keychain Token Store
// ============================================================================

/// Session token stored in the system keychain.
///
/// Clones share the remembered token.
#[derive(Debug, Clone)]
pub struct KeychainTokenStore {
    service: String,
    account: String,
    /// `None` until the keychain has answered once.
    cached: Arc<Mutex<Option<Option<String>>>>,
}

impl KeychainTokenStore {
    /// Store using the default service and account.
    pub fn new() -> Self {
        Self::with_names(SERVICE, TOKEN_ACCOUNT)
    }

    /// Store using a custom service and account (one per backend profile, for instance).
    pub fn with_names(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    fn entry(&self) -> Result<Entry, KeychainError> {
        Ok(Entry::new(&self.service, &self.account)?)
    }

    /// Reads the stored token straight from the keychain. Blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the keychain cannot be accessed. A missing entry is `Ok(None)`.
    pub fn get(&self) -> Result<Option<String>, KeychainError> {
        let token = match self.entry()?.get_password().map_err(KeychainError::from) {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        self.remember(token.clone());
        Ok(token)
    }

    /// The token from the last keychain answer, if there was one.
    fn remembered(&self) -> Option<Option<String>> {
        lock(&self.cached).clone()
    }

    fn remember(&self, token: Option<String>) {
        *lock(&self.cached) = Some(token);
    }

    /// Stores `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the keychain rejects the write.
    pub fn set(&self, token: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service, account = %self.account, "Storing token in keychain");
        self.entry()?.set_password(token).map_err(|e| {
            warn!(service = %self.service, error = %e, "Failed to store token");
            KeychainError::from(e)
        })?;
        self.remember(Some(token.to_string()));
        Ok(())
    }

    /// Removes the stored token. Removing a missing token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the keychain rejects the delete.
    pub fn clear(&self) -> Result<(), KeychainError> {
        match self.entry()?.delete_credential().map_err(KeychainError::from) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        debug!(service = %self.service, account = %self.account, "Token removed from keychain");
        self.remember(None);
        Ok(())
    }
}

impl Default for KeychainTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for KeychainTokenStore {
    async fn auth_token(&self) -> Option<String> {
        if let Some(token) = self.remembered() {
            trace!(service = %self.service, hit = true, "Keychain cache lookup");
            return token;
        }

        trace!(service = %self.service, hit = false, "Keychain cache miss, reading from keychain");
        let store = self.clone();
        match tokio::task::spawn_blocking(move || store.get()).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => {
                warn!(service = %self.service, error = %e, "Keychain lookup failed, continuing without token");
                None
            }
            Err(e) => {
                warn!(service = %self.service, error = %e, "Keychain lookup task failed");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
