//! Durable session storage for the authenticated user.
//!
//! The token and the identity fields derived from login are stored together
//! as a single JSON document in one OS keyring entry (`quizhub/session`).
//! Storing one document instead of four separate entries keeps the write
//! contract all-or-nothing: the session is written and removed as a unit,
//! so a reader can never observe a token without its identity fields or
//! vice versa.
//!
//! # Storage
//!
//! Production: single OS keyring entry `quizhub/session` containing JSON.
//! Test mode: file at `{config_dir}/session.json`.
//!
//! # Graceful Degradation
//!
//! A missing entry is the normal logged-out state, not an error. A document
//! that no longer parses is treated as absent and logged; the user simply
//! logs in again.

use anyhow::Result;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use crate::constants::{KEYRING_SERVICE, KEYRING_SESSION, SESSION_FILE_NAME};

/// Role reported by the server at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Administrator account.
    Admin,
    /// Regular user account.
    User,
}

impl UserType {
    /// Returns the string representation used in API payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::User => "user",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated session, as one indivisible document.
///
/// All four fields are populated together at login and cleared together on
/// logout or invalidation; the store never holds a partial session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Auth token issued by the server. May or may not carry the
    /// `"Bearer "` prefix; the HTTP client normalizes either form.
    pub token: String,
    /// Server-side user id. The wire value can be numeric or a string;
    /// it is stored as a string.
    pub user_id: String,
    /// Login name.
    pub username: String,
    /// Account role.
    pub user_type: UserType,
}

/// Where the session document lives.
#[derive(Debug, Clone)]
enum Backend {
    /// OS keyring entry (production).
    Keyring,
    /// Plain JSON file (tests and `QUIZHUB_ENV=test`).
    File(PathBuf),
}

/// Handle to the durable session store.
///
/// Cheap to clone; every handle reads and writes the same underlying
/// entry, so the most recent write wins regardless of which handle made
/// it. Take it as a constructor dependency rather than reaching into
/// ambient storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    backend: Backend,
}

impl SessionStore {
    /// Creates a store using the default backend for the current
    /// environment: the OS keyring in production, a file under the config
    /// directory in test mode.
    pub fn new() -> Result<Self> {
        if crate::env::should_skip_keyring() {
            let path = crate::config::Config::config_dir()?.join(SESSION_FILE_NAME);
            Ok(Self {
                backend: Backend::File(path),
            })
        } else {
            Ok(Self {
                backend: Backend::Keyring,
            })
        }
    }

    /// Creates a store backed by an explicit file.
    ///
    /// Tests inject a path under a temp directory so the OS keyring is
    /// never touched.
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    /// Reads the current session, if any.
    ///
    /// A missing entry is the normal logged-out state. A document that
    /// fails to parse is logged and reported as absent.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        let json = match &self.backend {
            Backend::Keyring => match Self::entry() {
                Ok(entry) => match entry.get_password() {
                    Ok(json) => json,
                    Err(keyring::Error::NoEntry) => return None,
                    Err(e) => {
                        log::warn!("Could not read session from keyring: {e:?}");
                        return None;
                    }
                },
                Err(e) => {
                    log::warn!("Could not open keyring entry: {e:?}");
                    return None;
                }
            },
            Backend::File(path) => match fs::read_to_string(path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
                Err(e) => {
                    log::warn!("Could not read session file: {e}");
                    return None;
                }
            },
        };

        match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Stored session is corrupted, treating as logged out: {e}");
                None
            }
        }
    }

    /// Writes the full session document, replacing any previous one.
    pub fn set(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        match &self.backend {
            Backend::Keyring => {
                Self::entry()?
                    .set_password(&json)
                    .map_err(|e| anyhow::anyhow!("Failed to store session in keyring: {e:?}"))?;
                log::debug!("Saved session to OS keyring");
            }
            Backend::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, &json)?;
                #[cfg(unix)]
                fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
                log::debug!("Saved session to file");
            }
        }
        Ok(())
    }

    /// Removes the session document.
    ///
    /// The document is one entry, so removal is observed as a unit: no
    /// reader sees a token without its identity fields. Clearing an empty
    /// store is a no-op.
    pub fn clear(&self) -> Result<()> {
        match &self.backend {
            Backend::Keyring => {
                let entry = Self::entry()?;
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => {}
                    Err(e) => {
                        return Err(anyhow::anyhow!(
                            "Failed to delete session from keyring: {e:?}"
                        ))
                    }
                }
            }
            Backend::File(path) => match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    /// Convenience accessor for the stored token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.get().map(|s| s.token)
    }

    fn entry() -> Result<Entry> {
        Entry::new(KEYRING_SERVICE, KEYRING_SESSION)
            .map_err(|e| anyhow::anyhow!("Failed to create keyring entry: {e:?}"))
    }
}
