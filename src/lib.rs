//! Protocol-level GitHub App integration client.
//!
//! The crate authenticates as a GitHub App or as a user, executes raw
//! and paginated calls against the GitHub REST API while respecting its
//! rate-limit budget, and translates responses into typed domain
//! results. A thin orchestration layer performs the business checks the
//! host application needs (endpoint validity, required App permissions)
//! and a pure converter maps GitHub roles onto product permission sets.

pub mod application;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pagination;
pub mod permissions;
pub mod rate_limit;
pub mod security;

pub use application::{
    AppPermissions, Collaborator, GithubAppInstallation, GithubApplicationClient, Organization,
    Organizations, Repositories, Repository, Team,
};
pub use config::GithubAppConfiguration;
pub use error::GithubError;
pub use gateway::{
    ApplicationHttpClient, HeaderStrategy, ReqwestApplicationHttpClient, Response, TimeoutPolicy,
};
pub use pagination::PaginatedHttpClient;
pub use permissions::{PermissionMapping, ProductPermission, RepositoryPermissions};
pub use rate_limit::{Pacing, RateLimit, RateLimitChecker};
pub use security::{AccessToken, AppSecurity, Rs256AppSecurity};
