//! Domain models returned by the application client.
//!
//! Public structs expose only the fields callers consume; the private
//! `Api*` structs mirror the wire payloads and stay an implementation
//! detail of deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::permissions::RepositoryPermissions;

/// One page of organizations accessible to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organizations {
    /// Total number of matching organizations across all pages.
    pub total: u64,
    /// Organizations on this page; absent when the payload carried
    /// none.
    pub organizations: Option<Vec<Organization>>,
}

/// An organization the GitHub App is installed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Numeric account identifier.
    pub id: u64,
    /// Account login name.
    pub login: String,
}

/// One page of repository search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repositories {
    /// Total number of matching repositories across all pages.
    pub total: u64,
    /// Repositories on this page; absent when the payload carried
    /// none.
    pub repositories: Option<Vec<Repository>>,
}

/// A repository visible to the calling token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Numeric repository identifier.
    pub id: u64,
    /// Short repository name.
    pub name: String,
    /// `owner/name` form of the repository name.
    pub full_name: String,
    /// Browser URL of the repository.
    pub url: Option<String>,
    /// Whether the repository is private.
    pub is_private: bool,
    /// Default branch name.
    pub default_branch: Option<String>,
}

/// A team granted access to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Numeric team identifier.
    pub id: u64,
    /// Team display name.
    pub name: String,
    /// Permission the team holds on the repository.
    pub permission: Option<String>,
}

/// A user collaborating on a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    /// Numeric account identifier.
    pub id: u64,
    /// Account login name.
    pub login: String,
    /// Role name, possibly a custom site role.
    pub role_name: Option<String>,
    /// Granular permission flags granted to the collaborator.
    pub permissions: RepositoryPermissions,
}

/// Permission grants of a GitHub App or one of its installations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppPermissions {
    /// Access level on checks.
    pub checks: Option<String>,
    /// Access level on pull requests.
    pub pull_requests: Option<String>,
    /// Access level on repository metadata.
    pub metadata: Option<String>,
    /// Access level on repository contents.
    pub contents: Option<String>,
    /// Access level on organization members.
    pub members: Option<String>,
}

/// An installation of the GitHub App in an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubAppInstallation {
    /// Installation identifier, as exchanged with the token endpoints.
    pub installation_id: String,
    /// Login of the organization the App is installed in.
    pub organization_name: Option<String>,
    /// Permission grants of the installation.
    pub permissions: AppPermissions,
    /// Whether the installation is currently suspended.
    pub suspended: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiInstallationsPage {
    pub(super) total_count: u64,
    pub(super) installations: Option<Vec<ApiInstallation>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiInstallation {
    pub(super) id: u64,
    pub(super) suspended_at: Option<String>,
    pub(super) target_type: Option<String>,
    pub(super) account: Option<ApiAccount>,
    pub(super) permissions: Option<AppPermissions>,
}

impl ApiInstallation {
    pub(super) fn is_organization(&self) -> bool {
        let type_of = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|kind| kind.eq_ignore_ascii_case("organization"))
        };
        type_of(&self.target_type)
            || self
                .account
                .as_ref()
                .is_some_and(|account| type_of(&account.account_type))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiAccount {
    pub(super) id: Option<u64>,
    pub(super) login: Option<String>,
    #[serde(rename = "type")]
    pub(super) account_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiApp {
    pub(super) permissions: Option<AppPermissions>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepositorySearch {
    pub(super) total_count: u64,
    pub(super) items: Option<Vec<ApiRepository>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) id: u64,
    pub(super) name: String,
    pub(super) full_name: String,
    #[serde(default)]
    pub(super) private: bool,
    pub(super) html_url: Option<String>,
    pub(super) default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiInstallationToken {
    pub(super) token: String,
    pub(super) expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepositoryInstallation {
    pub(super) id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiTeam {
    pub(super) id: u64,
    pub(super) name: String,
    pub(super) permission: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCollaborator {
    pub(super) id: u64,
    pub(super) login: String,
    pub(super) role_name: Option<String>,
    pub(super) permissions: Option<RepositoryPermissions>,
}

impl From<ApiInstallation> for Organization {
    fn from(value: ApiInstallation) -> Self {
        let account = value.account;
        Self {
            id: account
                .as_ref()
                .and_then(|account| account.id)
                .unwrap_or(value.id),
            login: account
                .and_then(|account| account.login)
                .unwrap_or_default(),
        }
    }
}

impl From<ApiInstallation> for GithubAppInstallation {
    fn from(value: ApiInstallation) -> Self {
        Self {
            installation_id: value.id.to_string(),
            organization_name: value.account.and_then(|account| account.login),
            permissions: value.permissions.unwrap_or_default(),
            suspended: value.suspended_at.is_some(),
        }
    }
}

impl From<ApiRepository> for Repository {
    fn from(value: ApiRepository) -> Self {
        Self {
            id: value.id,
            name: value.name,
            full_name: value.full_name,
            url: value.html_url,
            is_private: value.private,
            default_branch: value.default_branch,
        }
    }
}

impl From<ApiTeam> for Team {
    fn from(value: ApiTeam) -> Self {
        Self {
            id: value.id,
            name: value.name,
            permission: value.permission,
        }
    }
}

impl From<ApiCollaborator> for Collaborator {
    fn from(value: ApiCollaborator) -> Self {
        Self {
            id: value.id,
            login: value.login,
            role_name: value.role_name,
            permissions: value.permissions.unwrap_or_default(),
        }
    }
}
