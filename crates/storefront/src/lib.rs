//! Teeshop storefront sync layer.
//!
//! Keeps local mirrors of the cart, wishlist and session consistent with
//! the shop backend, which owns all of that state.
//!
//! - [`api`]: typed REST client for the backend
//! - [`store`]: synchronous local mirror stores and session persistence
//! - [`sync`]: user actions pairing a store change with its backend call
//! - [`state::Storefront`]: one session's stores and actions, wired up

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod remote;
pub mod state;
pub mod store;
pub mod sync;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use config::StorefrontConfig;
pub use error::SyncError;
pub use state::Storefront;
