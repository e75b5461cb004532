//! CLI errors.

use thiserror::Error;

use teeshop_storefront::state::StorefrontError;
use teeshop_storefront::{ApiError, SyncError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Startup(#[from] StorefrontError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Sync(SyncError::Api(err))
    }
}

impl CliError {
    /// Message to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Sync(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    pub const fn needs_login(&self) -> bool {
        match self {
            Self::Sync(e) => e.needs_login(),
            _ => false,
        }
    }
}
