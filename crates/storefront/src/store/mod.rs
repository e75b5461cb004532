//! Local mirror stores.
//!
//! Synchronous, single-writer views of server-owned state. Locks are held
//! only inside a method call, never across an `.await`.

pub mod auth;
pub mod cart;
pub mod persist;
pub mod wishlist;

pub use auth::{AUTH_STORAGE_KEY, AuthSession, AuthState, AuthStore, SessionEvent};
pub use cart::{CartStore, CartStoreError, LineSnapshot};
pub use persist::{FileSessionStorage, MemorySessionStorage, PersistError, SessionStorage};
pub use wishlist::{EntrySnapshot, WishlistStore};
