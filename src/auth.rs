//! Session invalidation and the login/logout lifecycle.
//!
//! [`AuthGuard`] is the single place session state is destroyed outside an
//! explicit logout: when the server rejects a request with HTTP 401, the
//! response stage calls [`AuthGuard::invalidate_session`], which clears the
//! stored session document and sends the user back to the login boundary.
//!
//! The boundary itself is a trait seam: the CLI prints a hint to run
//! `quizhub login`, a GUI shell would navigate to its login view, and
//! tests count invocations.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::HttpClient;
use crate::constants::LOGIN_PATH;
use crate::session::{Session, SessionStore, UserType};

/// Where the user lands after the session is invalidated.
pub trait LoginBoundary: Send + Sync {
    /// Sends the user to the login page. Called exactly once per
    /// invalidation.
    fn redirect_to_login(&self);
}

/// Default boundary for a terminal consumer: there is no page to navigate,
/// so it tells the user how to start a new session.
#[derive(Debug, Default)]
pub struct CliLoginBoundary;

impl LoginBoundary for CliLoginBoundary {
    fn redirect_to_login(&self) {
        log::warn!("Session invalidated; returning to {}", LOGIN_PATH);
        eprintln!("Your session has expired. Run `quizhub login` to sign in again.");
    }
}

/// Reacts to authentication failures.
///
/// Clearing goes through the session store's single-document contract, so
/// no reader observes a partially-cleared session, and clearing an
/// already-empty store is a no-op. The redirect fires exactly once per
/// call. Invalidation never fails: a storage error at this point is logged
/// and the user is sent to the login boundary anyway.
#[derive(Clone)]
pub struct AuthGuard {
    store: SessionStore,
    boundary: Arc<dyn LoginBoundary>,
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AuthGuard {
    /// Creates a guard with the default CLI login boundary.
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self::with_boundary(store, Arc::new(CliLoginBoundary))
    }

    /// Creates a guard with an explicit login boundary.
    #[must_use]
    pub fn with_boundary(store: SessionStore, boundary: Arc<dyn LoginBoundary>) -> Self {
        Self { store, boundary }
    }

    /// Clears the stored session and redirects to the login boundary.
    ///
    /// Idempotent with respect to state: invalidating an already-empty
    /// session changes nothing. The redirect still fires, once per call.
    pub fn invalidate_session(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("Could not clear stored session during invalidation: {e}");
        }
        self.boundary.redirect_to_login();
    }
}

/// Successful response from `POST /api/login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// JWT issued by the server.
    pub access_token: String,
    /// User id; the server sends a number for regular users and the
    /// string `"admin"` for the administrator.
    pub user_id: Value,
    /// Login name echoed back.
    pub username: String,
    /// Account role.
    pub user_type: UserType,
    /// Human-readable status message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// User id as a string, whatever form it took on the wire.
    #[must_use]
    pub fn user_id_string(&self) -> String {
        match &self.user_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Logs in and stores the resulting session.
///
/// Posts the credentials to `/api/login`, then writes all four session
/// fields as one document. Bad credentials surface as the originating
/// call's 401 error.
pub async fn login(
    client: &HttpClient,
    username: &str,
    password: &str,
    user_type: UserType,
) -> Result<Session> {
    let payload = json!({
        "username": username,
        "password": password,
        "userType": user_type.as_str(),
    });

    let data = client
        .post("/api/login", Some(payload))
        .await
        .context("Login request failed")?;

    let parsed: LoginResponse =
        serde_json::from_value(data).context("Invalid login response")?;

    let session = Session {
        token: parsed.access_token.clone(),
        user_id: parsed.user_id_string(),
        username: parsed.username.clone(),
        user_type: parsed.user_type,
    };
    client.session().set(&session)?;

    if let Some(message) = &parsed.message {
        log::info!("{}", message);
    }
    log::info!("Logged in as {} ({})", session.username, session.user_type);

    Ok(session)
}

/// Ends the session locally by clearing the stored document.
pub fn logout(store: &SessionStore) -> Result<()> {
    store.clear()?;
    log::info!("Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingBoundary {
        redirects: AtomicUsize,
    }

    impl LoginBoundary for CountingBoundary {
        fn redirect_to_login(&self) {
            self.redirects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_session() -> Session {
        Session {
            token: "jwt-abc".to_string(),
            user_id: "3".to_string(),
            username: "sam".to_string(),
            user_type: UserType::User,
        }
    }

    #[test]
    fn test_invalidate_clears_session_and_redirects_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_file(dir.path().join("session.json"));
        store.set(&sample_session()).expect("set");

        let boundary = Arc::new(CountingBoundary::default());
        let guard = AuthGuard::with_boundary(store.clone(), Arc::clone(&boundary) as Arc<dyn LoginBoundary>);

        guard.invalidate_session();
        assert!(store.get().is_none());
        assert_eq!(boundary.redirects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_on_empty_session_is_safe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_file(dir.path().join("session.json"));

        let boundary = Arc::new(CountingBoundary::default());
        let guard = AuthGuard::with_boundary(store.clone(), Arc::clone(&boundary) as Arc<dyn LoginBoundary>);

        // Two concurrent 401s both invalidate; the second finds nothing to
        // clear and must not fail
        guard.invalidate_session();
        guard.invalidate_session();

        assert!(store.get().is_none());
        assert_eq!(boundary.redirects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_login_response_numeric_user_id() {
        let parsed: LoginResponse = serde_json::from_str(
            r#"{
                "message": "Login successful",
                "access_token": "jwt-xyz",
                "user_id": 17,
                "username": "sam",
                "user_type": "user"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(parsed.user_id_string(), "17");
        assert_eq!(parsed.user_type, UserType::User);
    }

    #[test]
    fn test_login_response_admin_string_user_id() {
        let parsed: LoginResponse = serde_json::from_str(
            r#"{
                "message": "Admin login successful",
                "access_token": "jwt-admin",
                "user_id": "admin",
                "username": "admin",
                "user_type": "admin"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(parsed.user_id_string(), "admin");
        assert_eq!(parsed.user_type, UserType::Admin);
    }
}
