//! Session value types owned by the auth state holder.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::profile::ProfileRecord;
use super::user::User;

/// Bearer credentials issued by the auth backend.
///
/// Token buffers are wiped on drop and never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    access_token: Zeroizing<String>,
    refresh_token: Option<Zeroizing<String>>,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token.map(Zeroizing::new);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|token| token.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the access token has expired at `now`. Tokens without an
    /// expiry never expire locally.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The signed-in identity together with its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub tokens: AuthTokens,
}

/// Published view of the session. Tokens are never published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Notifications pushed by the auth backend outside of explicit calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedOut,
    TokenExpired,
    TokenRefreshed(AuthTokens),
    UserUpdated(ProfileRecord),
}

/// Result of a successful signup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The backend issued a live session straight away.
    SignedIn(User),
    /// The account exists but its e-mail address must be confirmed first.
    ConfirmationRequired,
}
