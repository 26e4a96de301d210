//! Typed access tokens with their authorization header semantics.

use std::mem;

use chrono::{DateTime, Utc};

use crate::error::GithubError;

/// A credential accepted by the GitHub API.
///
/// Each variant carries an opaque token string and knows which
/// `Authorization` scheme GitHub expects for it: user and installation
/// tokens use the `token` prefix, App JWTs use `Bearer`.
///
/// Equality is value-based on the variant kind and the token string;
/// creation and expiry instants do not participate, so a re-minted
/// token with the same value compares equal.
#[derive(Debug, Clone)]
pub enum AccessToken {
    /// OAuth token identifying a user.
    User {
        /// Opaque token value.
        value: String,
    },
    /// Short-lived JWT identifying the GitHub App itself.
    App {
        /// Signed JWT value.
        value: String,
    },
    /// Token scoped to one App installation.
    Installation {
        /// Opaque token value.
        value: String,
        /// Instant the token was obtained.
        created_at: DateTime<Utc>,
    },
    /// Installation token with a server-advertised expiry.
    ExpiringInstallation {
        /// Opaque token value.
        value: String,
        /// Instant after which GitHub rejects the token.
        expires_at: DateTime<Utc>,
    },
}

impl AccessToken {
    /// Creates a user access token.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the value is blank.
    pub fn user(value: impl AsRef<str>) -> Result<Self, GithubError> {
        Ok(Self::User {
            value: non_blank(value)?,
        })
    }

    /// Creates an App JWT token.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the value is blank.
    pub fn app(value: impl AsRef<str>) -> Result<Self, GithubError> {
        Ok(Self::App {
            value: non_blank(value)?,
        })
    }

    /// Creates an installation token without a known expiry.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the value is blank.
    pub fn installation(
        value: impl AsRef<str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GithubError> {
        Ok(Self::Installation {
            value: non_blank(value)?,
            created_at,
        })
    }

    /// Creates an installation token with a known expiry instant.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the value is blank.
    pub fn expiring_installation(
        value: impl AsRef<str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, GithubError> {
        Ok(Self::ExpiringInstallation {
            value: non_blank(value)?,
            expires_at,
        })
    }

    /// Borrows the opaque token value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::User { value }
            | Self::App { value }
            | Self::Installation { value, .. }
            | Self::ExpiringInstallation { value, .. } => value.as_str(),
        }
    }

    /// Authorization scheme prefix GitHub expects for this token.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::App { .. } => "Bearer",
            Self::User { .. }
            | Self::Installation { .. }
            | Self::ExpiringInstallation { .. } => "token",
        }
    }

    /// Full `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.scheme(), self.value())
    }

    /// Whether the token is known to be expired at `now`.
    ///
    /// Only [`AccessToken::ExpiringInstallation`] can expire; every
    /// other variant reports `false`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::ExpiringInstallation { expires_at, .. } => *expires_at <= now,
            Self::User { .. } | Self::App { .. } | Self::Installation { .. } => false,
        }
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other) && self.value() == other.value()
    }
}

impl Eq for AccessToken {}

fn non_blank(value: impl AsRef<str>) -> Result<String, GithubError> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        return Err(GithubError::invalid_input("token value must not be blank"));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::AccessToken;
    use crate::error::GithubError;

    #[test]
    fn user_and_installation_tokens_use_token_scheme() {
        let user = AccessToken::user("abc").expect("token should be valid");
        let installation =
            AccessToken::installation("def", Utc::now()).expect("token should be valid");

        assert_eq!(user.authorization_header(), "token abc");
        assert_eq!(installation.scheme(), "token");
    }

    #[test]
    fn app_token_uses_bearer_scheme() {
        let app = AccessToken::app("jwt-value").expect("token should be valid");

        assert_eq!(app.authorization_header(), "Bearer jwt-value");
    }

    #[test]
    fn blank_value_is_rejected() {
        let error = AccessToken::user("   ").expect_err("blank token should fail");

        assert!(matches!(error, GithubError::InvalidInput { .. }));
    }

    #[test]
    fn equality_ignores_creation_instants() {
        let now = Utc::now();
        let earlier = now - Duration::minutes(5);
        let first = AccessToken::installation("same", now).expect("token should be valid");
        let second = AccessToken::installation("same", earlier).expect("token should be valid");

        assert_eq!(first, second);
    }

    #[test]
    fn equality_distinguishes_variants_with_same_value() {
        let user = AccessToken::user("same").expect("token should be valid");
        let app = AccessToken::app("same").expect("token should be valid");

        assert_ne!(user, app);
    }

    #[test]
    fn only_expiring_tokens_expire() {
        let now = Utc::now();
        let expired = AccessToken::expiring_installation("t", now - Duration::seconds(1))
            .expect("token should be valid");
        let fresh = AccessToken::expiring_installation("t", now + Duration::hours(1))
            .expect("token should be valid");
        let plain = AccessToken::installation("t", now - Duration::days(30))
            .expect("token should be valid");

        assert!(expired.is_expired(now));
        assert!(!fresh.is_expired(now));
        assert!(!plain.is_expired(now));
    }
}
