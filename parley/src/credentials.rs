//! Credential file resolution and fail-closed validation.
//!
//! Sign-in needs two files: a private key and a certificate. Their
//! locations come from `global.key` / `global.cert` in the config store,
//! falling back to well-known filenames in the application directory when
//! unset. Validation stats both files independently and fails as a whole
//! if either is missing.

use std::path::{Path, PathBuf};

use crate::config::ConfigStore;

/// Well-known key filename in the application directory.
pub const DEFAULT_KEY_FILE: &str = "user.key";

/// Well-known certificate filename in the application directory.
pub const DEFAULT_CERT_FILE: &str = "user.cert";

/// Errors from credential validation.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The key file does not exist.
    #[error("key file not found: {}", .0.display())]
    MissingKey(PathBuf),

    /// The certificate file does not exist.
    #[error("certificate file not found: {}", .0.display())]
    MissingCert(PathBuf),

    /// Neither file exists.
    #[error("key file not found: {}; certificate file not found: {}", key.display(), cert.display())]
    MissingBoth {
        /// Key path that was checked.
        key: PathBuf,
        /// Certificate path that was checked.
        cert: PathBuf,
    },
}

/// Resolved locations of the sign-in key and certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    /// Private key file.
    pub key: PathBuf,
    /// Certificate file.
    pub cert: PathBuf,
}

impl CredentialPaths {
    /// Resolve key and certificate locations from configuration.
    ///
    /// An unset or empty `global.key` falls back to `user.key` in
    /// `app_dir`; an unset or empty `global.cert` falls back to
    /// `user.cert` in `app_dir`.
    #[must_use]
    pub fn resolve(cfg: &ConfigStore, app_dir: &Path) -> Self {
        let key = non_empty(cfg.get_opt("global.key"))
            .map_or_else(|| app_dir.join(DEFAULT_KEY_FILE), PathBuf::from);
        let cert = non_empty(cfg.get_opt("global.cert"))
            .map_or_else(|| app_dir.join(DEFAULT_CERT_FILE), PathBuf::from);
        Self { key, cert }
    }

    /// Check that both files exist on disk.
    ///
    /// Fail-closed: both files are stat'd independently and a single
    /// missing file fails the validation as a whole. The error names every
    /// missing path.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] naming the missing file(s).
    pub fn validate(&self) -> Result<(), CredentialError> {
        match (self.key.exists(), self.cert.exists()) {
            (true, true) => Ok(()),
            (false, true) => Err(CredentialError::MissingKey(self.key.clone())),
            (true, false) => Err(CredentialError::MissingCert(self.cert.clone())),
            (false, false) => Err(CredentialError::MissingBoth {
                key: self.key.clone(),
                cert: self.cert.clone(),
            }),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
