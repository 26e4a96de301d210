//! GitHub App configuration consumed by the client operations.
//!
//! The host application owns how configuration is loaded and persisted
//! (encrypted settings storage, environment layering, and so on); this
//! module only defines the validated shape the client needs: the App
//! identifier, the RSA private key used to sign app JWTs, and the API
//! endpoint of the GitHub instance.

use std::fmt;

use serde::Deserialize;

/// Configuration of a GitHub App installation target.
///
/// `Debug` output redacts the private key so configurations can be
/// logged safely.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct GithubAppConfiguration {
    /// Numeric GitHub App identifier.
    pub id: u64,
    /// PEM-encoded RSA private key of the App.
    pub private_key: String,
    /// API endpoint of the GitHub instance, e.g. `https://api.github.com`
    /// or `https://github.example.com/api/v3`.
    pub api_endpoint: String,
}

impl GithubAppConfiguration {
    /// Creates a configuration from its parts.
    #[must_use]
    pub fn new(
        id: u64,
        private_key: impl Into<String>,
        api_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id,
            private_key: private_key.into(),
            api_endpoint: api_endpoint.into(),
        }
    }
}

impl fmt::Debug for GithubAppConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubAppConfiguration")
            .field("id", &self.id)
            .field("private_key", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::GithubAppConfiguration;

    #[test]
    fn debug_output_redacts_private_key() {
        let config = GithubAppConfiguration::new(1, "very-secret-pem", "https://api.github.com");

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("very-secret-pem"));
        assert!(rendered.contains("<redacted>"));
    }
}
