//! Normalized HTTP responses and response-header extraction.

use http::{HeaderMap, StatusCode, header};

use crate::rate_limit::RateLimit;

/// Normalized result of one HTTP exchange with the platform.
///
/// `content` follows the calling verb's contract (a GET only carries a
/// body on 200, writes also accept 201, a 204 is always empty);
/// `next_endpoint`, when present, is usable verbatim as the endpoint of
/// the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    code: StatusCode,
    content: Option<String>,
    rate_limit: Option<RateLimit>,
    next_endpoint: Option<String>,
}

impl Response {
    /// Creates a response from a status code and optional body.
    #[must_use]
    pub const fn new(code: StatusCode, content: Option<String>) -> Self {
        Self {
            code,
            content,
            rate_limit: None,
            next_endpoint: None,
        }
    }

    /// Attaches the rate-limit snapshot parsed from response headers.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: Option<RateLimit>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Attaches the next-page endpoint extracted from the `Link` header.
    #[must_use]
    pub fn with_next_endpoint(mut self, next_endpoint: Option<String>) -> Self {
        self.next_endpoint = next_endpoint;
        self
    }

    /// HTTP status code of the exchange.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Body content, when the verb's contract accepts one for this
    /// status.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Rate-limit snapshot, when the platform reported one.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit
    }

    /// Endpoint of the next page, when a `next` link relation was
    /// present.
    #[must_use]
    pub fn next_endpoint(&self) -> Option<&str> {
        self.next_endpoint.as_deref()
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// Extracts a rate-limit snapshot from the `x-ratelimit-*` headers.
///
/// Header name matching is case-insensitive. The snapshot is produced
/// only when all three counters are present and numeric.
pub(super) fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimit> {
    let remaining = numeric_header(headers, "x-ratelimit-remaining")?;
    let limit = numeric_header(headers, "x-ratelimit-limit")?;
    let reset = numeric_header(headers, "x-ratelimit-reset")?;
    Some(RateLimit::new(remaining, limit, reset))
}

fn numeric_header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Extracts the `rel="next"` target from the `Link` header, if any.
pub(super) fn next_endpoint_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(next_relation)
}

/// Locates the entry whose `rel` attribute equals `next` in a
/// `<url>; rel="..."` link header value.
///
/// The position of the entry among other relations, the quoting of the
/// `rel` value, and its case are all irrelevant, so GitHub-style and
/// GitLab-style headers parse alike.
fn next_relation(link: &str) -> Option<String> {
    for entry in link.split(',') {
        let mut url = None;
        let mut is_next = false;
        for segment in entry.split(';') {
            let trimmed = segment.trim();
            if let Some(target) = trimmed
                .strip_prefix('<')
                .and_then(|rest| rest.strip_suffix('>'))
            {
                url = Some(target);
            } else if let Some(relation) = trimmed.strip_prefix("rel=") {
                is_next = relation.trim_matches('"').eq_ignore_ascii_case("next");
            }
        }
        if is_next && let Some(target) = url {
            return Some(target.to_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue};
    use rstest::rstest;

    use super::{next_relation, rate_limit_from_headers};
    use crate::rate_limit::RateLimit;

    #[rstest]
    #[case::next_first(
        r#"<https://api.github.com/repos?page=2>; rel="next", <https://api.github.com/repos?page=5>; rel="last""#
    )]
    #[case::next_last(
        r#"<https://api.github.com/repos?page=1>; rel="prev", <https://api.github.com/repos?page=5>; rel="last", <https://api.github.com/repos?page=2>; rel="next""#
    )]
    #[case::uppercase_relation(r#"<https://api.github.com/repos?page=2>; rel="NEXT""#)]
    #[case::unquoted_relation("<https://api.github.com/repos?page=2>; rel=next")]
    fn next_relation_is_found_regardless_of_position_and_case(#[case] link: &str) {
        assert_eq!(
            next_relation(link).as_deref(),
            Some("https://api.github.com/repos?page=2")
        );
    }

    #[test]
    fn gitlab_style_link_header_parses_identically() {
        let link = r#"<https://gitlab.example.com/api/v4/projects?page=2&per_page=100>; rel="next", <https://gitlab.example.com/api/v4/projects?page=1&per_page=100>; rel="first""#;

        assert_eq!(
            next_relation(link).as_deref(),
            Some("https://gitlab.example.com/api/v4/projects?page=2&per_page=100")
        );
    }

    #[rstest]
    #[case::no_next(r#"<https://api.github.com/repos?page=5>; rel="last""#)]
    #[case::empty("")]
    #[case::url_without_relation("<https://api.github.com/repos?page=2>")]
    fn absent_next_relation_yields_none(#[case] link: &str) {
        assert_eq!(next_relation(link), None);
    }

    #[test]
    fn rate_limit_requires_all_three_counters() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("1"));
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("10"));

        assert_eq!(rate_limit_from_headers(&headers), None);

        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1000"));

        assert_eq!(
            rate_limit_from_headers(&headers),
            Some(RateLimit::new(1, 10, 1000))
        );
    }

    #[test]
    fn absent_rate_limit_headers_yield_none() {
        assert_eq!(rate_limit_from_headers(&HeaderMap::new()), None);
    }
}
