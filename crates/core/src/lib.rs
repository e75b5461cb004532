//! Teeshop Core - Shared domain types.
//!
//! This crate provides the types used across all Teeshop components:
//! - `storefront` - Client-side mirror stores and sync actions
//! - `cli` - Command-line front end over the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no persistence. The backend owns every entity; these types are
//! the client's view of its JSON documents.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, sizes, emails and statuses
//! - [`models`] - Product, cart, wishlist, user, order and admin documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
