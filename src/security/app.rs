//! GitHub App JWT creation.
//!
//! GitHub Apps authenticate with an RS256-signed JWT whose claims name
//! the App (`iss`), the issue instant (`iat`, backdated slightly to
//! tolerate clock drift) and an expiry at most ten minutes out.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

use crate::error::GithubError;
use crate::security::AccessToken;

/// Clock drift allowance applied to the `iat` claim.
const ISSUED_AT_BACKDATE_SECONDS: i64 = 10;

/// Upper bound GitHub places on App JWT lifetimes.
const MAX_EXPIRATION_MINUTES: i64 = 10;

/// Creates App JWTs from a configured App id and private key.
#[cfg_attr(test, mockall::automock)]
pub trait AppSecurity: Send + Sync {
    /// Mints a JWT identifying the App itself.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the private key cannot
    /// be read or signing fails.
    fn create_app_token(&self, app_id: u64, private_key: &str)
    -> Result<AccessToken, GithubError>;
}

#[derive(Serialize)]
struct AppTokenClaims {
    iss: u64,
    iat: i64,
    exp: i64,
}

/// RS256 implementation of [`AppSecurity`] backed by `jsonwebtoken`.
#[derive(Debug, Clone)]
pub struct Rs256AppSecurity {
    expiration: Duration,
}

impl Rs256AppSecurity {
    /// Creates a security helper minting JWTs with the maximum
    /// ten-minute lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expiration: Duration::minutes(MAX_EXPIRATION_MINUTES),
        }
    }

    /// Creates a security helper with a custom JWT lifetime.
    ///
    /// # Panics
    ///
    /// Panics when `expiration` exceeds GitHub's ten-minute maximum.
    #[must_use]
    pub fn with_expiration(expiration: Duration) -> Self {
        assert!(
            expiration <= Duration::minutes(MAX_EXPIRATION_MINUTES),
            "App JWT lifetime cannot exceed {MAX_EXPIRATION_MINUTES} minutes"
        );
        Self { expiration }
    }
}

impl Default for Rs256AppSecurity {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSecurity for Rs256AppSecurity {
    fn create_app_token(
        &self,
        app_id: u64,
        private_key: &str,
    ) -> Result<AccessToken, GithubError> {
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|error| {
            GithubError::invalid_input(format!("Failed to read the App private key: {error}"))
        })?;

        let now = Utc::now();
        let claims = AppTokenClaims {
            iss: app_id,
            iat: (now - Duration::seconds(ISSUED_AT_BACKDATE_SECONDS)).timestamp(),
            exp: (now + self.expiration).timestamp(),
        };

        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|error| {
            GithubError::invalid_input(format!("Failed to sign the App token: {error}"))
        })?;

        AccessToken::app(jwt)
    }
}
