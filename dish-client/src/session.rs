//! Ordering session - owns the cart of the signed-in user
//!
//! The session is the single writer of its [`CartAggregate`]; callers get an
//! explicit handle instead of a global store.

use crate::backend::OrderBackend;
use crate::cart::{CartAggregate, LockNotificationChannel};
use crate::checkout::{CheckoutDetails, OrderDraft};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::lifecycle::{OrderLifecycleSync, OrderTracker};
use serde::Serialize;
use shared::catalog::AffinityResolver;
use shared::order::OrderDocument;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    /// Durable id assigned by the backend
    pub order_id: String,
    /// Provisional id assigned before the create call
    pub local_id: i64,
    /// Local copy of the stored order
    pub echo: OrderDocument,
}

/// Cart + checkout for one user
pub struct OrderingSession {
    user_id: String,
    backend: Arc<dyn OrderBackend>,
    cart: CartAggregate,
    lifecycle: OrderLifecycleSync,
    config: ClientConfig,
}

impl std::fmt::Debug for OrderingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderingSession")
            .field("user_id", &self.user_id)
            .field("cart", &self.cart)
            .field("config", &self.config)
            .finish()
    }
}

impl OrderingSession {
    pub fn new(
        user_id: impl Into<String>,
        backend: Arc<dyn OrderBackend>,
        resolver: AffinityResolver,
        config: ClientConfig,
    ) -> Self {
        let lock = LockNotificationChannel::new(config.lock_channel_capacity);
        Self {
            user_id: user_id.into(),
            lifecycle: OrderLifecycleSync::new(backend.clone()),
            backend,
            cart: CartAggregate::new(resolver, lock),
            config,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cart(&self) -> &CartAggregate {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartAggregate {
        &mut self.cart
    }

    pub fn lifecycle(&self) -> &OrderLifecycleSync {
        &self.lifecycle
    }

    /// Submit the cart as a new order.
    ///
    /// The cart is cleared only after the backend accepted the order; on
    /// failure it is left intact so the user can retry.
    pub async fn place_order(&mut self, details: CheckoutDetails) -> ClientResult<PlacedOrder> {
        let draft = OrderDraft::from_cart(&self.cart.snapshot(), &self.user_id, details, &self.config)?;

        let order_id = match self.backend.create_order(&draft).await {
            Ok(id) => id,
            Err(e) => {
                warn!(local_id = draft.local_id, error = %e, "Order placement failed");
                return Err(e);
            }
        };

        self.cart.clear_cart();
        crate::order_audit!(
            order_id,
            "placed",
            format!("restaurant={} total={}", draft.restaurant_id, draft.fees.total)
        );
        info!(
            order_id = %order_id,
            local_id = draft.local_id,
            restaurant_id = %draft.restaurant_id,
            items = draft.items.len(),
            total = %draft.fees.total,
            "Order placed"
        );

        Ok(PlacedOrder {
            echo: draft.echo(order_id.clone()),
            local_id: draft.local_id,
            order_id,
        })
    }

    /// Follow a placed order, starting from its local echo
    pub fn track_order(&self, placed: &PlacedOrder) -> OrderTracker {
        self.lifecycle.track(placed.echo.clone())
    }
}
