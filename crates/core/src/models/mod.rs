//! Entity documents exchanged with the backend.
//!
//! Field names follow the backend's camelCase JSON and its `_id` key.

pub mod admin;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

pub use admin::{Analytics, CategoryRevenue, LowStockProduct};
pub use cart::{Cart, CartItem, CartKey};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine, ShippingAddress};
pub use product::{Product, ProductInput};
pub use user::{User, UserPatch};
pub use wishlist::{Wishlist, WishlistEntry};
