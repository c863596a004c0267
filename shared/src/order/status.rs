//! Order status vocabulary and the user-facing projection
//!
//! The backend owns the raw status field; the ordering client never writes
//! it for its own order. Restaurants only ever move an order forward:
//!
//! ```text
//! pending ──► accepted ──► preparing ──► delivered
//!    │           │             │
//!    ▼           ▼             ▼
//! rejected    canceled      canceled
//! canceled
//! ```

use crate::error::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw order status as stored by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Preparing,
    Delivered,
    Rejected,
    Canceled,
}

impl OrderStatus {
    /// Statuses shown in the restaurant's in-flight panel
    pub const IN_FLIGHT: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Accepted];

    /// Statuses shown in the restaurant's order history
    pub const HISTORY: [OrderStatus; 3] = [
        OrderStatus::Rejected,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Preparing => "preparing",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }

    /// Terminal states are kept for history and never move again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Canceled)
    }

    /// Whether the restaurant may move an order from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Accepted | Rejected | Canceled)
                | (Accepted, Preparing | Delivered | Canceled)
                | (Preparing, Delivered | Canceled)
        )
    }

    /// Validate a transition, returning the target on success
    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "preparing" => Ok(Self::Preparing),
            "delivered" => Ok(Self::Delivered),
            "rejected" => Ok(Self::Rejected),
            "canceled" => Ok(Self::Canceled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Simplified status shown to the ordering user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusView {
    AwaitingConfirmation,
    Confirmed,
    Rejected,
}

impl OrderStatusView {
    /// Project a raw backend status string.
    ///
    /// `pending` waits for confirmation, `canceled` reads as rejected, and
    /// every other value (including unrecognized strings) counts as confirmed.
    pub fn project(raw: &str) -> Self {
        match raw {
            "pending" => Self::AwaitingConfirmation,
            "canceled" => Self::Rejected,
            _ => Self::Confirmed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

impl From<OrderStatus> for OrderStatusView {
    fn from(status: OrderStatus) -> Self {
        Self::project(status.as_str())
    }
}

impl fmt::Display for OrderStatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_of_raw_statuses() {
        assert_eq!(
            OrderStatusView::project("pending"),
            OrderStatusView::AwaitingConfirmation
        );
        assert_eq!(OrderStatusView::project("canceled"), OrderStatusView::Rejected);
        assert_eq!(OrderStatusView::project("accepted"), OrderStatusView::Confirmed);
        assert_eq!(OrderStatusView::project("preparing"), OrderStatusView::Confirmed);
        assert_eq!(OrderStatusView::project("delivered"), OrderStatusView::Confirmed);
    }

    #[test]
    fn test_projection_of_unrecognized_status_is_confirmed() {
        assert_eq!(OrderStatusView::project("on_the_way"), OrderStatusView::Confirmed);
        assert_eq!(OrderStatusView::project(""), OrderStatusView::Confirmed);
        // Case matters: only the exact vocabulary is recognized
        assert_eq!(OrderStatusView::project("PENDING"), OrderStatusView::Confirmed);
    }

    #[test]
    fn test_projection_from_enum_matches_raw() {
        assert_eq!(
            OrderStatusView::from(OrderStatus::Pending),
            OrderStatusView::AwaitingConfirmation
        );
        assert_eq!(
            OrderStatusView::from(OrderStatus::Canceled),
            OrderStatusView::Rejected
        );
        // `rejected` is not in the projection's special cases
        assert_eq!(
            OrderStatusView::from(OrderStatus::Rejected),
            OrderStatusView::Confirmed
        );
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Delivered,
            OrderStatus::Rejected,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert_eq!(
            "cancelled".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus("cancelled".to_string()))
        );
    }

    #[test]
    fn test_serde_uses_lowercase_vocabulary() {
        let json = serde_json::to_string(&OrderStatus::Canceled).unwrap();
        assert_eq!(json, "\"canceled\"");
        let view = serde_json::to_string(&OrderStatusView::AwaitingConfirmation).unwrap();
        assert_eq!(view, "\"awaiting_confirmation\"");
    }

    #[test]
    fn test_forward_transitions_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Accepted));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Rejected));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Canceled));

        assert!(!OrderStatus::Accepted.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Rejected));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in OrderStatus::HISTORY {
            assert!(terminal.is_terminal());
            assert_eq!(
                terminal.transition_to(OrderStatus::Accepted),
                Err(OrderError::InvalidTransition {
                    from: terminal,
                    to: OrderStatus::Accepted,
                })
            );
        }
        for active in OrderStatus::IN_FLIGHT {
            assert!(!active.is_terminal());
        }
    }
}
