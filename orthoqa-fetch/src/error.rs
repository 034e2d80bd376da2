//! Host API error types.
//!
//! Request failures are [`orthoqa_core::ApiError`]; this module covers the
//! host integrations around the client.

use thiserror::Error;

// ============================================================================
// Keychain Error
// ============================================================================

/// Why the session token could not be read from or written to the keychain.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// The keychain is locked or the user refused access.
    #[error("Keychain access denied; unlock the keychain or set token_backend to \"file\"")]
    AccessDenied,

    /// No token is stored under the service and account.
    #[error("No OrthoQA token in the keychain")]
    NotFound,

    /// The stored token is not valid UTF-8.
    #[error("Stored OrthoQA token is not valid text; log in again to replace it")]
    CorruptToken,

    /// The service or account name was rejected by the platform store.
    #[error("Invalid keychain entry: {0}")]
    InvalidEntry(String),

    /// The platform secure-storage service failed.
    #[error("Keychain unavailable: {0}")]
    Platform(String),
}

impl KeychainError {
    /// True when the entry simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => Self::NotFound,
            keyring::Error::NoStorageAccess(_) => Self::AccessDenied,
            keyring::Error::BadEncoding(_) => Self::CorruptToken,
            keyring::Error::TooLong(attr, limit) => {
                Self::InvalidEntry(format!("{attr} is longer than {limit} characters"))
            }
            keyring::Error::Invalid(attr, reason) => Self::InvalidEntry(format!("{attr}: {reason}")),
            keyring::Error::Ambiguous(found) => {
                Self::InvalidEntry(format!("{} tokens match the entry", found.len()))
            }
            keyring::Error::PlatformFailure(e) => Self::Platform(e.to_string()),
            other => Self::Platform(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_not_found() {
        let err = KeychainError::from(keyring::Error::NoEntry);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No OrthoQA token in the keychain");
    }

    #[test]
    fn test_locked_keychain_suggests_file_backend() {
        let err = KeychainError::from(keyring::Error::NoStorageAccess("locked".into()));
        assert!(matches!(err, KeychainError::AccessDenied));
        assert!(err.to_string().contains("token_backend"));
    }

    #[test]
    fn test_bad_encoding_is_corrupt_token() {
        let err = KeychainError::from(keyring::Error::BadEncoding(vec![0xff, 0xfe]));
        assert!(matches!(err, KeychainError::CorruptToken));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_rejected_names_are_invalid_entry() {
        let err = KeychainError::from(keyring::Error::TooLong("service".to_string(), 64));
        assert!(matches!(err, KeychainError::InvalidEntry(ref m) if m.contains("service")));

        let err = KeychainError::from(keyring::Error::Invalid(
            "account".to_string(),
            "empty".to_string(),
        ));
        assert!(matches!(err, KeychainError::InvalidEntry(ref m) if m == "account: empty"));
    }

    #[test]
    fn test_platform_failure_keeps_cause() {
        let err = KeychainError::from(keyring::Error::PlatformFailure("dbus gone".into()));
        assert_eq!(err.to_string(), "Keychain unavailable: dbus gone");
    }
}
