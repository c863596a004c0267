//! Lock notification channel
//!
//! Broadcasts a notice whenever the cart refuses an item from a second
//! restaurant. Presentation layers subscribe and decide how to render it;
//! dropping the receiver unsubscribes. Slow consumers lag and lose old
//! notices, they never block the cart.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Conflict notice published on a rejected add
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockNotice {
    /// Human-readable message for the user
    pub message: String,
    /// Item that was refused
    pub item_id: String,
    /// Restaurant the cart is locked to, if known
    pub cart_restaurant: Option<String>,
    /// Restaurant of the refused item, if known
    pub requested_restaurant: Option<String>,
}

impl LockNotice {
    pub fn new(
        item_id: impl Into<String>,
        cart_restaurant: Option<String>,
        requested_restaurant: Option<String>,
    ) -> Self {
        let message = match (&cart_restaurant, &requested_restaurant) {
            (Some(cart), Some(requested)) => format!(
                "Your cart already has items from {cart}. Clear the cart to order from {requested}."
            ),
            (Some(cart), None) => format!(
                "Your cart already has items from {cart}. This item can't be matched to that restaurant."
            ),
            _ => "Your cart can only hold items from one restaurant. Clear the cart to add this item."
                .to_string(),
        };
        Self {
            message,
            item_id: item_id.into(),
            cart_restaurant,
            requested_restaurant,
        }
    }
}

/// Multi-consumer broadcast of [`LockNotice`]s
#[derive(Debug, Clone)]
pub struct LockNotificationChannel {
    tx: broadcast::Sender<LockNotice>,
}

impl LockNotificationChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to conflict notices; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<LockNotice> {
        self.tx.subscribe()
    }

    /// Publish a notice, returning how many subscribers received it
    pub fn publish(&self, notice: LockNotice) -> usize {
        // No subscribers is fine: the caller still gets the notice back
        self.tx.send(notice).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LockNotificationChannel {
    fn default() -> Self {
        Self::new(16)
    }
}
