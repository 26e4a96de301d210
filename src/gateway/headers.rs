//! Per-platform request header policies.

/// Non-auth headers sent with every request to a hosting platform.
///
/// A strategy is an explicit value handed to the HTTP client at
/// construction time, never a process-wide default, so multiple
/// platform configurations can coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderStrategy {
    accept: String,
    api_version: Option<(String, String)>,
}

impl HeaderStrategy {
    /// Header policy for the GitHub REST API: the `vnd.github` media
    /// type and the pinned API version.
    #[must_use]
    pub fn github() -> Self {
        Self {
            accept: "application/vnd.github+json".to_owned(),
            api_version: Some(("X-GitHub-Api-Version".to_owned(), "2022-11-28".to_owned())),
        }
    }

    /// Header policy for a platform with a custom media type and an
    /// optional version-pinning header.
    #[must_use]
    pub fn custom(
        accept: impl Into<String>,
        api_version: Option<(String, String)>,
    ) -> Self {
        Self {
            accept: accept.into(),
            api_version,
        }
    }

    /// The `Accept` media type to send.
    #[must_use]
    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// The version-pinning header, when the platform defines one.
    #[must_use]
    pub fn api_version(&self) -> Option<(&str, &str)> {
        self.api_version
            .as_ref()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub(super) fn apply(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request = request.header(http::header::ACCEPT, &self.accept);
        if let Some((name, value)) = &self.api_version {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }
}
