//! Shared types for the Dish ordering client
//!
//! Pure domain types used by the client crate: cart line items and their
//! customizations, restaurant affinity resolution, the backend order status
//! vocabulary and its user-facing projection, and the order document shape.

pub mod catalog;
pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use catalog::{AffinityResolver, ItemCatalog, RestaurantAliases};
pub use error::{OrderError, OrderResult};
pub use order::{
    CartItemInput, CartLineItem, Customization, OrderDocument, OrderStatus, OrderStatusView,
};
pub use rust_decimal::Decimal;
