//! Protocol-level HTTP client for the GitHub REST API.
//!
//! This module executes individual requests against a base URL plus
//! endpoint, injecting the token's `Authorization` header and the
//! platform's header strategy, and normalizes the outcome into a
//! [`Response`] carrying the status, body content per the verb's
//! contract, the rate-limit snapshot, and the next-page endpoint. The
//! trait-based design enables mocking in tests while the reqwest
//! implementation handles real HTTP requests. Retry policy belongs to
//! higher layers; this one surfaces transport failures as-is.

mod headers;
mod response;

pub use headers::HeaderStrategy;
pub use response::Response;

use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode, header};
use tracing::warn;
use url::Url;

use crate::error::GithubError;
use crate::security::AccessToken;

/// Connect and overall request deadlines applied to every call.
///
/// Production code uses the default; tests inject short values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    connect: Duration,
    request: Duration,
}

impl TimeoutPolicy {
    /// Creates a policy from explicit connect and request deadlines.
    #[must_use]
    pub const fn new(connect: Duration, request: Duration) -> Self {
        Self { connect, request }
    }

    /// Deadline for establishing the connection.
    #[must_use]
    pub const fn connect(&self) -> Duration {
        self.connect
    }

    /// Deadline for the whole request, body included.
    #[must_use]
    pub const fn request(&self) -> Duration {
        self.request
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(30))
    }
}

/// Executes raw HTTP calls against a hosting platform API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationHttpClient: Send + Sync {
    /// Performs a GET, logging a warning when the status is not 200.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] for a malformed endpoint or
    /// URL combination, and [`GithubError::Network`] for transport
    /// failures. A non-200 status is not an error at this layer.
    async fn get(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a GET without logging on unexpected statuses.
    ///
    /// For callers that treat non-200 statuses as expected outcomes.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn get_silent(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a bodiless POST.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn post(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a bodiless POST without credentials.
    ///
    /// Used for the OAuth token exchange, which authenticates through
    /// query parameters instead of an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn post_anonymous(
        &self,
        base_url: &str,
        endpoint: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a POST carrying a JSON body.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn post_json(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        json_body: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a PATCH carrying a JSON body.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn patch(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        json_body: &str,
    ) -> Result<Response, GithubError>;

    /// Performs a DELETE.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApplicationHttpClient::get`].
    async fn delete(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError>;
}

/// Reqwest-backed [`ApplicationHttpClient`].
#[derive(Debug, Clone)]
pub struct ReqwestApplicationHttpClient {
    client: reqwest::Client,
    headers: HeaderStrategy,
}

impl ReqwestApplicationHttpClient {
    /// Creates a client with the given header strategy and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Network`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(headers: HeaderStrategy, timeouts: TimeoutPolicy) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.request())
            .build()
            .map_err(|error| {
                GithubError::network(format!("failed to build the HTTP client: {error}"))
            })?;
        Ok(Self { client, headers })
    }

    fn resolve_url(base_url: &str, endpoint: &str) -> Result<Url, GithubError> {
        if !endpoint.starts_with('/') && !endpoint.starts_with("http") {
            return Err(GithubError::invalid_input(
                "endpoint must start with '/' or 'http'",
            ));
        }
        let combined = if endpoint.starts_with("http") {
            endpoint.to_owned()
        } else {
            format!("{}{}", base_url.trim_end_matches('/'), endpoint)
        };
        Url::parse(&combined)
            .map_err(|_| GithubError::invalid_input(format!("{combined} is not a valid url")))
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        token: Option<&AccessToken>,
        json_body: Option<&str>,
    ) -> Result<(StatusCode, http::HeaderMap, String), GithubError> {
        let mut request = self.headers.apply(self.client.request(method, url));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, token.authorization_header());
        }
        if let Some(body) = json_body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.to_owned());
        }

        let upstream = request
            .send()
            .await
            .map_err(|error| GithubError::network(error.to_string()))?;
        let status = upstream.status();
        let response_headers = upstream.headers().clone();
        let body = upstream
            .text()
            .await
            .map_err(|error| GithubError::network(error.to_string()))?;
        Ok((status, response_headers, body))
    }

    async fn get_internal(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        silent: bool,
    ) -> Result<Response, GithubError> {
        let url = Self::resolve_url(base_url, endpoint)?;
        let (status, response_headers, body) =
            self.execute(Method::GET, url, Some(token), None).await?;

        if status != StatusCode::OK && !silent {
            warn!("GET response did not have expected HTTP code (was {status}): {body}");
        }

        let content = (status == StatusCode::OK && !body.is_empty()).then_some(body);
        let next_endpoint = if content.is_some() {
            response::next_endpoint_from_headers(&response_headers)
        } else {
            None
        };

        Ok(Response::new(status, content)
            .with_rate_limit(response::rate_limit_from_headers(&response_headers))
            .with_next_endpoint(next_endpoint))
    }

    async fn write_internal(
        &self,
        method: Method,
        base_url: &str,
        token: Option<&AccessToken>,
        endpoint: &str,
        json_body: Option<&str>,
    ) -> Result<Response, GithubError> {
        let url = Self::resolve_url(base_url, endpoint)?;
        let (status, response_headers, body) =
            self.execute(method, url, token, json_body).await?;

        // 200/201 carry the payload, 204 is an empty success, anything
        // else keeps the raw body for the caller to format into a
        // user-facing message.
        let content = (status != StatusCode::NO_CONTENT && !body.is_empty()).then_some(body);

        Ok(Response::new(status, content)
            .with_rate_limit(response::rate_limit_from_headers(&response_headers)))
    }
}

#[async_trait]
impl ApplicationHttpClient for ReqwestApplicationHttpClient {
    async fn get(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError> {
        self.get_internal(base_url, token, endpoint, false).await
    }

    async fn get_silent(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError> {
        self.get_internal(base_url, token, endpoint, true).await
    }

    async fn post(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError> {
        self.write_internal(Method::POST, base_url, Some(token), endpoint, None)
            .await
    }

    async fn post_anonymous(
        &self,
        base_url: &str,
        endpoint: &str,
    ) -> Result<Response, GithubError> {
        self.write_internal(Method::POST, base_url, None, endpoint, None)
            .await
    }

    async fn post_json(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        json_body: &str,
    ) -> Result<Response, GithubError> {
        self.write_internal(Method::POST, base_url, Some(token), endpoint, Some(json_body))
            .await
    }

    async fn patch(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        json_body: &str,
    ) -> Result<Response, GithubError> {
        self.write_internal(Method::PATCH, base_url, Some(token), endpoint, Some(json_body))
            .await
    }

    async fn delete(
        &self,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
    ) -> Result<Response, GithubError> {
        self.write_internal(Method::DELETE, base_url, Some(token), endpoint, None)
            .await
    }
}
