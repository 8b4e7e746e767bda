//! Admin console gate.
//!
//! A single operator account, configured rather than compiled in. Failed
//! logins answer after a fixed delay; there is no lockout and no attempt
//! counting. Successful logins receive an opaque session token held in
//! memory until logout, restart, or eviction by a newer login once
//! [`MAX_SESSIONS`] tokens are open. Tokens have no time-based expiry.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, SiteError};

/// Open sessions kept at most; a login beyond this drops the oldest.
pub const MAX_SESSIONS: usize = 8;

/// Credential check and session registry for the admin console.
#[derive(Debug)]
pub struct AdminGate {
    username: String,
    password: String,
    delay: Duration,
    /// Open tokens, oldest first.
    sessions: RwLock<VecDeque<String>>,
}

impl AdminGate {
    /// Creates a gate for one account.
    ///
    /// An empty password disables login entirely.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, delay: Duration) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            delay,
            sessions: RwLock::new(VecDeque::new()),
        }
    }

    /// Checks the credentials and opens a session.
    ///
    /// Every attempt waits for the configured delay before answering.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidCredentials`] if the username or password
    /// does not match, or if no password is configured.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;

        if self.password.is_empty() {
            warn!("Admin login attempted but no admin password is configured");
            return Err(SiteError::InvalidCredentials);
        }
        if username != self.username || password != self.password {
            info!(username, "Admin login rejected");
            return Err(SiteError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= MAX_SESSIONS {
            sessions.pop_front();
            debug!("Oldest admin session evicted");
        }
        sessions.push_back(token.clone());
        drop(sessions);
        info!(username, "Admin logged in");
        Ok(token)
    }

    /// Checks that `token` belongs to an open session.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Unauthorized`] otherwise.
    pub async fn verify(&self, token: &str) -> Result<()> {
        if self.sessions.read().await.iter().any(|open| open == token) {
            Ok(())
        } else {
            Err(SiteError::Unauthorized)
        }
    }

    /// Closes the session. Returns `false` if it was not open.
    pub async fn logout(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|open| open != token);
        let removed = sessions.len() != before;
        drop(sessions);
        if removed {
            info!("Admin logged out");
        }
        removed
    }

    /// Number of open sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
