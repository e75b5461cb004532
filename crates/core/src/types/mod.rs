//! Core types for Teeshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod size;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use size::{ParseSizeError, Size, SizeStock};
pub use status::{OrderStatus, Rating};
