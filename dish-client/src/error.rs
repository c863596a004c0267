//! Client error types

use shared::OrderError;
use shared::order::OrderStatus;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend unavailable or write rejected
    #[error("Backend error: {0}")]
    Backend(String),

    /// Order document not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout attempted while the cart has no resolvable restaurant
    #[error("Cart items do not resolve to a restaurant")]
    MissingRestaurant,

    /// Status change not allowed by the order flow
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<OrderError> for ClientError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition { from, to } => ClientError::InvalidTransition { from, to },
            OrderError::UnknownStatus(status) => {
                ClientError::Backend(format!("unknown order status: {status}"))
            }
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_maps_from_order_error() {
        let err: ClientError = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        }
        .into();
        assert!(matches!(err, ClientError::InvalidTransition { .. }));
        assert_eq!(err.to_string(), "Cannot move order from delivered to pending");
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(ClientError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            ClientError::Backend("offline".to_string()).to_string(),
            "Backend error: offline"
        );
    }
}
