//! Error types for the shared crate

use crate::order::OrderStatus;
use thiserror::Error;

/// Order domain errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Raw status string outside the backend vocabulary
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// Status change that the one-way order flow does not allow
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// Result type for order domain operations
pub type OrderResult<T> = Result<T, OrderError>;
