//! Application-wide constants for quizhub.
//!
//! This module centralizes all magic numbers and configuration constants
//! to improve maintainability and discoverability. Constants are grouped
//! by domain with documentation explaining their purpose.
//!
//! # Categories
//!
//! - **Timeouts**: Network timeouts and the notification override
//! - **Server**: Default server address and well-known paths
//! - **Storage**: Keyring service and entry names

use std::time::Duration;

// ============================================================================
// Timeouts
// ============================================================================

/// HTTP client request timeout for ordinary API calls.
///
/// This is the default applied to every request. 10 seconds is sufficient
/// for most API operations while preventing indefinite hangs on network
/// issues.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP request timeout for notification endpoints.
///
/// Notification routes fan out email delivery on the server side and can
/// take much longer than a plain CRUD call, so requests whose path matches
/// [`NOTIFY_URL_MARKERS`] get this timeout instead of the default.
pub const NOTIFY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Server
// ============================================================================

/// Default base URL of the Quiz Master server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Path substrings that mark a request as notification-related.
///
/// A request whose path contains any of these gets the long
/// [`NOTIFY_REQUEST_TIMEOUT`]. Matching is case-sensitive, same as the
/// paths the dispatcher builds.
pub const NOTIFY_URL_MARKERS: &[&str] = &["notify", "notification", "email"];

/// Login page the user is sent back to when the session is invalidated.
pub const LOGIN_PATH: &str = "/login";

// ============================================================================
// Storage
// ============================================================================

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "quizhub";

/// Keyring entry holding the consolidated session document.
pub const KEYRING_SESSION: &str = "session";

/// File name for the session document when keyring is bypassed.
pub const SESSION_FILE_NAME: &str = "session.json";
