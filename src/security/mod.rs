//! Credentials and GitHub App token creation.
//!
//! This module defines the typed access tokens the client sends with
//! every request, and the seam used to mint short-lived App JWTs from a
//! configured private key. Tokens are created immediately before a
//! request, never persisted, and discarded after use.

mod app;
mod token;

pub use app::{AppSecurity, Rs256AppSecurity};
pub use token::AccessToken;

#[cfg(test)]
pub use app::MockAppSecurity;
