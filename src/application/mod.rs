//! High-level GitHub App operations used by the host application.
//!
//! Each operation is a short sequence with no persistent state:
//! validate input, acquire a token, call the raw or paginated client,
//! classify the result, return a typed value or a domain error whose
//! message names the operation and target so operators can act on it.

mod models;

pub use models::{
    AppPermissions, Collaborator, GithubAppInstallation, Organization, Organizations,
    Repositories, Repository, Team,
};

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use crate::config::GithubAppConfiguration;
use crate::error::GithubError;
use crate::gateway::ApplicationHttpClient;
use crate::pagination::PaginatedHttpClient;
use crate::security::{AccessToken, AppSecurity};

use models::{
    ApiApp, ApiCollaborator, ApiInstallation, ApiInstallationToken, ApiInstallationsPage,
    ApiRepository, ApiRepositoryInstallation, ApiRepositorySearch, ApiTeam,
};

/// Largest page size GitHub accepts on listing endpoints.
const MAX_PAGE_SIZE: u32 = 100;

/// Permissions the App must hold, with the level each one requires.
const REQUIRED_APP_PERMISSIONS: [(&str, &str); 2] =
    [("pull_requests", "write"), ("checks", "write")];

/// Client for the GitHub App operations exposed to the host
/// application.
pub struct GithubApplicationClient<Http, Security> {
    http: Http,
    security: Security,
    paginated: PaginatedHttpClient,
}

impl<Http, Security> GithubApplicationClient<Http, Security>
where
    Http: ApplicationHttpClient,
    Security: AppSecurity,
{
    /// Creates a client over the given HTTP and App-security seams.
    #[must_use]
    pub const fn new(http: Http, security: Security, paginated: PaginatedHttpClient) -> Self {
        Self {
            http,
            security,
            paginated,
        }
    }

    /// Validates that the configured API endpoint plausibly points at a
    /// GitHub instance.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when the URL is missing,
    /// uses a non-http(s) scheme, or matches neither `api.github.com`
    /// nor an Enterprise `/api/v3` path.
    pub fn check_api_endpoint(
        &self,
        config: &GithubAppConfiguration,
    ) -> Result<(), GithubError> {
        let endpoint = config.api_endpoint.trim();
        if endpoint.is_empty() {
            return Err(GithubError::invalid_input("Missing URL"));
        }
        let parsed = Url::parse(endpoint)
            .map_err(|_| GithubError::invalid_input("Invalid GitHub URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GithubError::invalid_input(
                "Only http and https schemes are supported",
            ));
        }
        let is_public_api = parsed
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case("api.github.com"));
        let is_enterprise_api = parsed.path().to_ascii_lowercase().contains("/api/v");
        if !is_public_api && !is_enterprise_api {
            return Err(GithubError::invalid_input("Invalid GitHub URL"));
        }
        Ok(())
    }

    /// Verifies that the App credentials work and that the App holds
    /// every permission the product needs.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] with a user-actionable
    /// message for transport failures, authentication rejections and
    /// insufficient grants, and [`GithubError::UnexpectedResponse`]
    /// when the success body carries no permissions object.
    pub async fn check_app_permissions(
        &self,
        config: &GithubAppConfiguration,
    ) -> Result<(), GithubError> {
        let app_token = self
            .security
            .create_app_token(config.id, &config.private_key)?;

        let response = match self.http.get(&config.api_endpoint, &app_token, "/app").await {
            Ok(response) => response,
            Err(GithubError::Network { .. }) => {
                return Err(GithubError::invalid_input(
                    "Failed to validate configuration, check URL and Private Key",
                ));
            }
            Err(other) => return Err(other),
        };

        match response.code() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GithubError::invalid_input(
                "Authentication failed, verify the Client Id, Client Secret and Private Key fields",
            )),
            StatusCode::NOT_FOUND => Err(GithubError::invalid_input(
                "Failed to check permissions with Github, check the configuration",
            )),
            _ => {
                let Some(granted) = response
                    .content()
                    .and_then(|content| serde_json::from_str::<ApiApp>(content).ok())
                    .and_then(|app| app.permissions)
                else {
                    return Err(GithubError::unexpected_response(
                        "Failed to get app permissions, unexpected response body",
                    ));
                };

                let mut missing = Vec::new();
                for (name, required) in REQUIRED_APP_PERMISSIONS {
                    let level = match name {
                        "pull_requests" => granted.pull_requests.as_deref(),
                        _ => granted.checks.as_deref(),
                    };
                    if grant_rank(level) < grant_rank(Some(required)) {
                        missing.push(format!(
                            "{name} is '{granted}', should be '{required}'",
                            granted = level.unwrap_or("none")
                        ));
                    }
                }

                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(GithubError::invalid_input(format!(
                        "Missing permissions; permission granted on {}",
                        missing.join(", ")
                    )))
                }
            }
        }
    }

    /// Looks up the App installation covering a repository.
    ///
    /// # Errors
    ///
    /// Propagates App-token creation failures and transport errors;
    /// an unexpected status becomes [`GithubError::Api`]. A missing
    /// installation (404) is `Ok(None)`.
    pub async fn get_installation_id(
        &self,
        config: &GithubAppConfiguration,
        repository_slug: &str,
    ) -> Result<Option<u64>, GithubError> {
        let app_token = self
            .security
            .create_app_token(config.id, &config.private_key)?;
        let endpoint = format!("/repos/{repository_slug}/installation");

        let response = self
            .http
            .get_silent(&config.api_endpoint, &app_token, &endpoint)
            .await?;
        match response.code() {
            StatusCode::OK => response
                .content()
                .map(parse_payload::<ApiRepositoryInstallation>)
                .transpose()
                .map(|installation| installation.map(|payload| payload.id)),
            StatusCode::NOT_FOUND => Ok(None),
            other => Err(GithubError::api(format!(
                "Failed to get the installation of repository '{repository_slug}': return code {}",
                other.as_u16()
            ))),
        }
    }

    /// Exchanges an OAuth authorization code for a user access token.
    ///
    /// The OAuth endpoint lives on the application host, not the API
    /// host, so the API URL is first translated (`api.github.com`
    /// becomes `github.com`, Enterprise hosts drop the `/api/v3`
    /// suffix).
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] when GitHub rejects the
    /// code, and [`GithubError::Api`] when the exchange fails or the
    /// response carries no token.
    pub async fn create_user_access_token(
        &self,
        api_url: &str,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<AccessToken, GithubError> {
        let app_url = app_url_from_api_url(api_url)?;
        let endpoint = format!(
            "/login/oauth/access_token?client_id={client_id}&client_secret={client_secret}&code={code}"
        );

        let response = match self.http.post_anonymous(&app_url, &endpoint).await {
            Ok(response) => response,
            Err(GithubError::Network { .. }) => {
                return Err(GithubError::api("Failed to create GitHub's user access token"));
            }
            Err(other) => return Err(other),
        };

        if let Some(content) = response.content() {
            if let Some(token) = form_value(content, "access_token") {
                return AccessToken::user(token);
            }
            if form_value(content, "error").is_some() {
                return Err(GithubError::invalid_input(format!(
                    "Failed to create GitHub's user access token. GitHub returned: {content}"
                )));
            }
        }
        Err(GithubError::api("Failed to create GitHub's user access token"))
    }

    /// Exchanges the App JWT for an installation token.
    ///
    /// Upstream failures on this endpoint are expected (a revoked or
    /// suspended installation) and produce `Ok(None)` with a warning
    /// log rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] only when the App token
    /// itself cannot be created.
    pub async fn create_app_installation_token(
        &self,
        config: &GithubAppConfiguration,
        installation_id: u64,
    ) -> Result<Option<AccessToken>, GithubError> {
        let app_token = self
            .security
            .create_app_token(config.id, &config.private_key)?;
        let endpoint = format!("/app/installations/{installation_id}/access_tokens");

        let response = match self
            .http
            .post(&config.api_endpoint, &app_token, &endpoint)
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!("Failed to request {endpoint}: {error}");
                return Ok(None);
            }
        };
        if !response.is_success() {
            warn!(
                "Failed to request {endpoint}: return code {}",
                response.code().as_u16()
            );
            return Ok(None);
        }

        let Some(payload) = response
            .content()
            .and_then(|content| serde_json::from_str::<ApiInstallationToken>(content).ok())
        else {
            warn!("Failed to request {endpoint}: unexpected response body");
            return Ok(None);
        };

        let token = match payload.expires_at {
            Some(expires_at) => AccessToken::expiring_installation(payload.token, expires_at)?,
            None => AccessToken::installation(payload.token, chrono::Utc::now())?,
        };
        Ok(Some(token))
    }

    /// Lists the organizations whose App installations the token can
    /// see.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] for out-of-range paging
    /// values before any network call, and [`GithubError::Api`] naming
    /// the operation and URL when the call fails.
    pub async fn list_organizations(
        &self,
        api_url: &str,
        token: &AccessToken,
        page: u32,
        page_size: u32,
    ) -> Result<Organizations, GithubError> {
        validate_page_bounds(page, page_size)?;
        let endpoint = format!("/user/installations?page={page}&per_page={page_size}");

        let response = match self.http.get(api_url, token, &endpoint).await {
            Ok(response) => response,
            Err(GithubError::Network { .. }) => {
                return Err(GithubError::api(format!(
                    "Failed to list all organizations accessible by user access token on {api_url}"
                )));
            }
            Err(other) => return Err(other),
        };

        let Some(content) = response.content() else {
            return Ok(Organizations {
                total: 0,
                organizations: None,
            });
        };
        let payload: ApiInstallationsPage = parse_payload(content)?;
        Ok(Organizations {
            total: payload.total_count,
            organizations: payload.installations.map(|installations| {
                installations.into_iter().map(Organization::from).collect()
            }),
        })
    }

    /// Searches the repositories of an organization visible to the
    /// token, optionally filtered by a free-text term.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::InvalidInput`] for out-of-range paging
    /// values before any network call, and [`GithubError::Api`] naming
    /// the operation, URL and query when the call fails.
    pub async fn list_repositories(
        &self,
        api_url: &str,
        token: &AccessToken,
        organization: &str,
        query: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Repositories, GithubError> {
        validate_page_bounds(page, page_size)?;
        let search = query
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map_or_else(
                || format!("fork:true+org:{organization}"),
                |text| format!("{text}+fork:true+org:{organization}"),
            );
        let endpoint =
            format!("/search/repositories?q={search}&page={page}&per_page={page_size}");

        let response = match self.http.get(api_url, token, &endpoint).await {
            Ok(response) => response,
            Err(GithubError::Network { .. }) => {
                return Err(GithubError::api(format!(
                    "Failed to list all repositories of '{organization}' accessible by user access token on '{api_url}' using query '{search}'"
                )));
            }
            Err(other) => return Err(other),
        };

        let Some(content) = response.content() else {
            return Ok(Repositories {
                total: 0,
                repositories: None,
            });
        };
        let payload: ApiRepositorySearch = parse_payload(content)?;
        Ok(Repositories {
            total: payload.total_count,
            repositories: payload
                .items
                .map(|items| items.into_iter().map(Repository::from).collect()),
        })
    }

    /// Fetches a single repository by its `owner/name` key.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Api`] naming the repository and URL when
    /// the call fails. Any non-200 status, including 404, is
    /// `Ok(None)`.
    pub async fn get_repository(
        &self,
        api_url: &str,
        token: &AccessToken,
        repository_key: &str,
    ) -> Result<Option<Repository>, GithubError> {
        let endpoint = format!("/repos/{repository_key}");

        let response = match self.http.get(api_url, token, &endpoint).await {
            Ok(response) => response,
            Err(GithubError::Network { .. }) => {
                return Err(GithubError::api(format!(
                    "Failed to get repository '{repository_key}' on '{api_url}' (this might be related to the GitHub App installation scope)"
                )));
            }
            Err(other) => return Err(other),
        };

        response
            .content()
            .map(parse_payload::<ApiRepository>)
            .transpose()
            .map(|repository| repository.map(Repository::from))
    }

    /// Lists every team granted access to a repository.
    ///
    /// # Errors
    ///
    /// Pagination failures are returned unchanged; their message
    /// already carries the status code and body.
    pub async fn get_repository_teams(
        &self,
        api_url: &str,
        token: &AccessToken,
        organization: &str,
        repository: &str,
    ) -> Result<Vec<Team>, GithubError> {
        let endpoint = format!("/repos/{organization}/{repository}/teams");
        let teams: Vec<ApiTeam> = self
            .paginated
            .get_all(&self.http, api_url, token, &endpoint, parse_list)
            .await?;
        Ok(teams.into_iter().map(Team::from).collect())
    }

    /// Lists every user directly collaborating on a repository.
    ///
    /// # Errors
    ///
    /// Pagination failures are returned unchanged; their message
    /// already carries the status code and body.
    pub async fn get_repository_collaborators(
        &self,
        api_url: &str,
        token: &AccessToken,
        organization: &str,
        repository: &str,
    ) -> Result<Vec<Collaborator>, GithubError> {
        let endpoint =
            format!("/repos/{organization}/{repository}/collaborators?affiliation=direct");
        let collaborators: Vec<ApiCollaborator> = self
            .paginated
            .get_all(&self.http, api_url, token, &endpoint, parse_list)
            .await?;
        Ok(collaborators.into_iter().map(Collaborator::from).collect())
    }

    /// Lists the App's installations in organizations, keeping only
    /// those in the allow-list when one is configured.
    ///
    /// # Errors
    ///
    /// Propagates App-token creation failures and pagination failures
    /// unchanged.
    pub async fn list_app_installations(
        &self,
        config: &GithubAppConfiguration,
        allowed_organizations: &[String],
    ) -> Result<Vec<GithubAppInstallation>, GithubError> {
        let app_token = self
            .security
            .create_app_token(config.id, &config.private_key)?;
        let installations: Vec<ApiInstallation> = self
            .paginated
            .get_all(
                &self.http,
                &config.api_endpoint,
                &app_token,
                "/app/installations",
                parse_list,
            )
            .await?;

        Ok(installations
            .into_iter()
            .filter(ApiInstallation::is_organization)
            .map(GithubAppInstallation::from)
            .filter(|installation| {
                allowed_organizations.is_empty()
                    || installation.organization_name.as_deref().is_some_and(|name| {
                        allowed_organizations
                            .iter()
                            .any(|allowed| allowed.eq_ignore_ascii_case(name))
                    })
            })
            .collect())
    }
}

/// Ranks a permission grant so levels compare as none < read < write
/// < admin.
fn grant_rank(level: Option<&str>) -> u8 {
    match level {
        Some("admin") => 3,
        Some("write") => 2,
        Some("read") => 1,
        _ => 0,
    }
}

fn validate_page_bounds(page: u32, page_size: u32) -> Result<(), GithubError> {
    if page == 0 {
        return Err(GithubError::invalid_input("'page' must be larger than 0."));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(GithubError::invalid_input(
            "'pageSize' must be a value larger than 0 and smaller or equal to 100.",
        ));
    }
    Ok(())
}

/// Derives the application host from an API URL.
fn app_url_from_api_url(api_url: &str) -> Result<String, GithubError> {
    let trimmed = api_url.trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|_| GithubError::invalid_input(format!("{api_url} is not a valid url")))?;
    if parsed
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case("api.github.com"))
    {
        Ok(format!("{}://github.com", parsed.scheme()))
    } else {
        Ok(trimmed
            .strip_suffix("/api/v3")
            .unwrap_or(trimmed)
            .to_owned())
    }
}

fn parse_payload<T: DeserializeOwned>(content: &str) -> Result<T, GithubError> {
    serde_json::from_str(content).map_err(|error| {
        GithubError::unexpected_response(format!(
            "Failed to parse the response from GitHub: {error}"
        ))
    })
}

fn parse_list<T: DeserializeOwned>(content: &str) -> Result<Vec<T>, GithubError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_payload(content)
}

fn form_value<'content>(content: &'content str, key: &str) -> Option<&'content str> {
    content.split('&').find_map(|pair| {
        pair.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
    })
}
