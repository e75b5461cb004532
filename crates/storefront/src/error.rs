//! Errors surfaced by sync actions.

use thiserror::Error;

use teeshop_core::{OrderStatus, Size};

use crate::api::{ApiError, ErrorKind};
use crate::store::{CartStoreError, PersistError};

/// Failure of a user-facing action. Nothing here is fatal; the caller
/// shows [`SyncError::user_message`] and lets the user retry.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Please log in first")]
    NotAuthenticated,

    #[error("Size {size} is out of stock")]
    OutOfStock { size: Size },

    #[error("Only {available} left in stock (requested {requested})")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please fill in street, city and postal code")]
    IncompleteAddress,

    #[error("Only delivered orders can be rated (order is {0})")]
    NotRateable(OrderStatus),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Product is not part of this order")]
    NotInOrder,

    #[error("Another update for this item is still in progress")]
    InFlight,

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<CartStoreError> for SyncError {
    fn from(err: CartStoreError) -> Self {
        match err {
            CartStoreError::InvalidQuantity(_) => Self::InvalidQuantity,
        }
    }
}

impl SyncError {
    /// Text for a toast or inline message; prefers the backend's wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(api) => api.server_message().map_or_else(
                || match api.kind() {
                    ErrorKind::Authorization => "Your session has expired, please log in again".to_string(),
                    ErrorKind::NotFound => "Not found".to_string(),
                    ErrorKind::Validation | ErrorKind::Transport => {
                        "Something went wrong, please try again".to_string()
                    }
                },
                ToString::to_string,
            ),
            Self::Persist(_) => "Could not save your session on this device".to_string(),
            other => other.to_string(),
        }
    }

    /// True when the user should be sent to login.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        match self {
            Self::NotAuthenticated => true,
            Self::Api(api) => matches!(api, ApiError::Unauthorized(_)),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
