//! Authentication types for JWT bearer tokens.
//!
//! Tokens are minted by the upstream identity provider (Google sign-in in
//! production) with a shared secret; this service only validates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role name that grants write access to catalog and order records.
pub const SUPERUSER_ROLE: &str = "admin";

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stable user identifier from the identity provider).
    pub sub: String,
    /// User email, when the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User's role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        subject: &str,
        email: Option<&str>,
        role: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.to_string(),
            email: email.map(String::from),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the subject from claims.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Returns true if the holder may modify records.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.role == SUPERUSER_ROLE
    }
}
