//! Order Module
//!
//! This module provides the order-side domain types:
//! - Types: cart line items, candidates and customization identity
//! - Status: backend status vocabulary and the user-facing projection
//! - Document: the backend's order record and its lenient decoding

pub mod document;
pub mod status;
pub mod types;

// Re-exports
pub use document::{
    DeliveryAddress, DisplayItem, FeeBreakdown, OrderDocument, PaymentMethod,
    PLACEHOLDER_ITEM_NAME, total_quantity,
};
pub use status::{OrderStatus, OrderStatusView};
pub use types::*;
