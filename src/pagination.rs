//! Cursor-based pagination over collection endpoints.
//!
//! The paginated client repeatedly issues GETs, following each page's
//! `next` link verbatim, pacing itself through the rate-limit checker
//! between pages, and folding every page's deserialized payload into
//! one aggregate in arrival order. Deserialization is supplied by the
//! caller so this layer stays decoupled from any specific JSON schema.

use tokio_util::sync::CancellationToken;

use crate::error::GithubError;
use crate::gateway::ApplicationHttpClient;
use crate::rate_limit::{Pacing, RateLimitChecker};
use crate::security::AccessToken;

/// Page size requested from collection endpoints.
const PAGE_SIZE: u32 = 100;

/// Follows `next` links across a collection endpoint and aggregates
/// every page.
#[derive(Debug, Clone)]
pub struct PaginatedHttpClient {
    rate_limit_checker: RateLimitChecker,
    cancellation: CancellationToken,
}

impl PaginatedHttpClient {
    /// Creates a paginated client pacing itself through the given
    /// checker.
    #[must_use]
    pub fn new(rate_limit_checker: RateLimitChecker) -> Self {
        Self {
            rate_limit_checker,
            cancellation: CancellationToken::new(),
        }
    }

    /// Uses the given token to make rate-limit waits cancellable from
    /// outside.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Fetches every page of `endpoint` and returns the concatenated
    /// elements in page order.
    ///
    /// A `per_page=100` query parameter is appended to the initial
    /// endpoint; subsequent endpoints come verbatim from the server's
    /// `next` link. An empty collection is a normal terminal case. A
    /// cancelled rate-limit wait is absorbed and fetching continues
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Api`] for a non-2xx page, embedding the
    /// status code and response body; deserialization and transport
    /// failures propagate unchanged.
    pub async fn get_all<T, F>(
        &self,
        http: &dyn ApplicationHttpClient,
        base_url: &str,
        token: &AccessToken,
        endpoint: &str,
        deserialize: F,
    ) -> Result<Vec<T>, GithubError>
    where
        F: Fn(&str) -> Result<Vec<T>, GithubError>,
    {
        let mut aggregate = Vec::new();
        let mut next = Some(with_page_size(endpoint));

        while let Some(current) = next {
            let response = http.get(base_url, token, &current).await?;
            if !response.is_success() {
                return Err(GithubError::api(format!(
                    "Error while executing a call to GitHub. Return code {}. Error message: {}.",
                    response.code().as_u16(),
                    response.content().unwrap_or_default()
                )));
            }

            let page = deserialize(response.content().unwrap_or_default())?;
            aggregate.extend(page);

            next = response.next_endpoint().map(ToOwned::to_owned);
            if next.is_some() {
                let rate_limit = response.rate_limit();
                let pacing = self
                    .rate_limit_checker
                    .check_rate_limit(rate_limit.as_ref(), &self.cancellation)
                    .await;
                match pacing {
                    // A cancelled wait never aborts the fetch.
                    Pacing::Proceed | Pacing::Waited(_) | Pacing::Cancelled => {}
                }
            }
        }

        Ok(aggregate)
    }
}

impl Default for PaginatedHttpClient {
    fn default() -> Self {
        Self::new(RateLimitChecker::new())
    }
}

fn with_page_size(endpoint: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}per_page={PAGE_SIZE}")
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use mockall::predicate::eq;

    use super::{PaginatedHttpClient, with_page_size};
    use crate::error::GithubError;
    use crate::gateway::{MockApplicationHttpClient, Response};
    use crate::rate_limit::RateLimit;
    use crate::security::AccessToken;

    const BASE_URL: &str = "https://github.mycorp.example/api/v3";

    fn user_token() -> AccessToken {
        AccessToken::user("user-token").expect("token should be valid")
    }

    fn parse_strings(content: &str) -> Result<Vec<String>, GithubError> {
        serde_json::from_str(content)
            .map_err(|error| GithubError::unexpected_response(error.to_string()))
    }

    #[test]
    fn page_size_is_appended_with_the_right_separator() {
        assert_eq!(with_page_size("/repos/o/r/teams"), "/repos/o/r/teams?per_page=100");
        assert_eq!(
            with_page_size("/repos/o/r/collaborators?affiliation=direct"),
            "/repos/o/r/collaborators?affiliation=direct&per_page=100"
        );
    }

    #[tokio::test]
    async fn two_pages_aggregate_in_order() {
        let mut http = MockApplicationHttpClient::new();
        let next_url = "https://github.mycorp.example/api/v3/items?per_page=100&page=2";

        http.expect_get()
            .with(eq(BASE_URL), eq(user_token()), eq("/items?per_page=100"))
            .times(1)
            .returning(move |_, _, _| {
                Ok(Response::new(
                    StatusCode::OK,
                    Some("[\"a\",\"b\"]".to_owned()),
                )
                .with_next_endpoint(Some(next_url.to_owned())))
            });
        http.expect_get()
            .with(eq(BASE_URL), eq(user_token()), eq(next_url))
            .times(1)
            .returning(|_, _, _| {
                Ok(Response::new(StatusCode::OK, Some("[\"c\"]".to_owned())))
            });

        let client = PaginatedHttpClient::default();
        let items = client
            .get_all(&http, BASE_URL, &user_token(), "/items", parse_strings)
            .await
            .expect("pagination should succeed");

        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn rate_limited_page_still_completes_the_fetch() {
        let mut http = MockApplicationHttpClient::new();
        let next_url = "https://github.mycorp.example/api/v3/items?per_page=100&page=2";

        // Budget fully consumed but the reset is already in the past,
        // so the checker proceeds without sleeping.
        http.expect_get()
            .with(eq(BASE_URL), eq(user_token()), eq("/items?per_page=100"))
            .times(1)
            .returning(move |_, _, _| {
                Ok(Response::new(StatusCode::OK, Some("[\"a\"]".to_owned()))
                    .with_rate_limit(Some(RateLimit::new(0, 5000, 0)))
                    .with_next_endpoint(Some(next_url.to_owned())))
            });
        http.expect_get()
            .with(eq(BASE_URL), eq(user_token()), eq(next_url))
            .times(1)
            .returning(|_, _, _| {
                Ok(Response::new(StatusCode::OK, Some("[\"b\"]".to_owned())))
            });

        let client = PaginatedHttpClient::default();
        let items = client
            .get_all(&http, BASE_URL, &user_token(), "/items", parse_strings)
            .await
            .expect("pagination should succeed");

        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn non_success_page_fails_with_code_and_body() {
        let mut http = MockApplicationHttpClient::new();
        http.expect_get().times(1).returning(|_, _, _| {
            Ok(Response::new(
                StatusCode::BAD_REQUEST,
                Some("{\"error\": \"help\"}".to_owned()),
            ))
        });

        let client = PaginatedHttpClient::default();
        let error = client
            .get_all(&http, BASE_URL, &user_token(), "/items", parse_strings)
            .await
            .expect_err("pagination should fail");

        assert_eq!(
            error,
            GithubError::api(
                "Error while executing a call to GitHub. Return code 400. Error message: {\"error\": \"help\"}."
            )
        );
    }

    #[tokio::test]
    async fn empty_collection_is_a_normal_terminal_case() {
        let mut http = MockApplicationHttpClient::new();
        http.expect_get()
            .times(1)
            .returning(|_, _, _| Ok(Response::new(StatusCode::OK, Some("[]".to_owned()))));

        let client = PaginatedHttpClient::default();
        let items = client
            .get_all(&http, BASE_URL, &user_token(), "/items", parse_strings)
            .await
            .expect("pagination should succeed");

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn transport_failures_propagate_unchanged() {
        let mut http = MockApplicationHttpClient::new();
        http.expect_get()
            .times(1)
            .returning(|_, _, _| Err(GithubError::network("connection reset")));

        let client = PaginatedHttpClient::default();
        let error = client
            .get_all(&http, BASE_URL, &user_token(), "/items", parse_strings)
            .await
            .expect_err("pagination should fail");

        assert_eq!(error, GithubError::network("connection reset"));
    }
}
