//! Dish Client - single-restaurant cart and order lifecycle
//!
//! Client-side core of a food ordering app:
//! - [`CartAggregate`]: the single-restaurant cart and its lock notices
//! - [`OrderingSession`]: checkout against an [`OrderBackend`]
//! - [`OrderLifecycleSync`]: the user's live view of a placed order
//! - [`RestaurantOrderFeed`]: the restaurant's live order board

pub mod backend;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod logger;
pub mod session;

pub use backend::{DocumentSnapshot, InMemoryOrderBackend, OrderBackend, Subscription};
pub use cart::{AddOutcome, CartAggregate, CartSnapshot, LockNotice, LockNotificationChannel};
pub use checkout::{CheckoutDetails, OrderDraft};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use feed::{FeedKind, FeedOrder, FeedState, RestaurantOrderFeed};
pub use lifecycle::{OrderLifecycleSync, OrderStatusUpdate, OrderTracker};
pub use session::{OrderingSession, PlacedOrder};

// Re-export shared types for convenience
pub use shared::catalog::{AffinityResolver, ItemCatalog, RestaurantAliases};
pub use shared::order::{
    CartItemInput, CartLineItem, Customization, OrderDocument, OrderStatus, OrderStatusView,
};
