//! Error types exposed by the GitHub integration client.

use thiserror::Error;

/// Errors surfaced while validating input or communicating with GitHub.
///
/// Variants follow the failure taxonomy of the client: input rejected
/// before any request is made, transport failures, upstream rejections
/// (including operation-level failures wrapped with caller context), and
/// success responses whose body cannot be interpreted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GithubError {
    /// An argument or configuration value was rejected before any
    /// network call.
    #[error("{message}")]
    InvalidInput {
        /// Description of the rejected value.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// GitHub rejected the call, or an operation failed in a way the
    /// caller must act on.
    #[error("{message}")]
    Api {
        /// Failure description naming the operation and target.
        message: String,
    },

    /// A success response carried a body that could not be interpreted.
    #[error("{message}")]
    UnexpectedResponse {
        /// Description of what was missing or malformed.
        message: String,
    },
}

impl GithubError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub(crate) fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }
}
