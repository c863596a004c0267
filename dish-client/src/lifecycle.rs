//! Order lifecycle sync - the ordering user's view of a placed order
//!
//! Watches one order document and projects the backend status onto the
//! three-value [`OrderStatusView`]. Every delivered snapshot produces exactly
//! one callback, the initial one included. A document that does not exist
//! produces [`OrderStatusUpdate::NotFound`] instead of silence.

use crate::backend::{DocumentSnapshot, OrderBackend, Subscription};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;
use shared::order::{OrderDocument, OrderStatusView};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// One delivery from an order status subscription
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderStatusUpdate {
    /// The document exists; `order` is the full decoded payload
    Changed {
        status: OrderStatusView,
        order: OrderDocument,
    },
    /// The backend has no document under this id
    NotFound { order_id: String },
}

impl OrderStatusUpdate {
    fn from_snapshot(order_id: &str, snapshot: Option<DocumentSnapshot>) -> Self {
        match snapshot {
            Some(snapshot) => {
                let order = OrderDocument::from_raw(&snapshot.id, &snapshot.data);
                OrderStatusUpdate::Changed {
                    status: order.status_view(),
                    order,
                }
            }
            None => OrderStatusUpdate::NotFound {
                order_id: order_id.to_string(),
            },
        }
    }

    /// Projected status, `None` for a missing document
    pub fn status(&self) -> Option<OrderStatusView> {
        match self {
            OrderStatusUpdate::Changed { status, .. } => Some(*status),
            OrderStatusUpdate::NotFound { .. } => None,
        }
    }

    pub fn order(&self) -> Option<&OrderDocument> {
        match self {
            OrderStatusUpdate::Changed { order, .. } => Some(order),
            OrderStatusUpdate::NotFound { .. } => None,
        }
    }
}

/// Subscribes to order documents on behalf of the ordering user
#[derive(Clone)]
pub struct OrderLifecycleSync {
    backend: Arc<dyn OrderBackend>,
}

impl OrderLifecycleSync {
    pub fn new(backend: Arc<dyn OrderBackend>) -> Self {
        Self { backend }
    }

    /// Invoke `callback` once per remote change of `order_id`.
    ///
    /// Independent subscriptions to the same order do not interfere; each
    /// gets its own handle.
    pub fn subscribe_order_status<F>(&self, order_id: &str, callback: F) -> Subscription
    where
        F: Fn(OrderStatusUpdate) + Send + Sync + 'static,
    {
        let id = order_id.to_string();
        self.backend.subscribe_order_document(
            order_id,
            Arc::new(move |snapshot: Option<DocumentSnapshot>| {
                let update = OrderStatusUpdate::from_snapshot(&id, snapshot);
                debug!(order_id = %id, status = ?update.status(), "Order status update");
                callback(update);
            }),
        )
    }

    /// Track an order in a `watch` channel seeded with `seed`
    pub fn track(&self, seed: OrderDocument) -> OrderTracker {
        OrderTracker::start(self, seed)
    }
}

/// Latest-value view of one order
///
/// Seeded with the local echo so the UI can render the order before the
/// backend's first snapshot arrives. Dropping the tracker cancels its
/// subscription.
#[derive(Debug)]
pub struct OrderTracker {
    order_id: String,
    rx: watch::Receiver<OrderStatusUpdate>,
    _subscription: Subscription,
}

impl OrderTracker {
    pub fn start(sync: &OrderLifecycleSync, seed: OrderDocument) -> Self {
        let order_id = seed.id.clone();
        let (tx, rx) = watch::channel(OrderStatusUpdate::Changed {
            status: seed.status_view(),
            order: seed,
        });

        let tracked = order_id.clone();
        let subscription = sync.subscribe_order_status(&order_id, move |update| {
            let previous = tx.borrow().status();
            if previous != update.status() {
                info!(order_id = %tracked, from = ?previous, to = ?update.status(), "Order status changed");
            }
            tx.send_replace(update);
        });

        Self {
            order_id,
            rx,
            _subscription: subscription,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn current(&self) -> OrderStatusUpdate {
        self.rx.borrow().clone()
    }

    pub fn status(&self) -> Option<OrderStatusView> {
        self.rx.borrow().status()
    }

    /// An independent receiver of the tracked value
    pub fn subscribe(&self) -> watch::Receiver<OrderStatusUpdate> {
        self.rx.clone()
    }

    /// Wait until the projected status equals `status`
    pub async fn wait_for_status(&mut self, status: OrderStatusView) -> ClientResult<OrderStatusUpdate> {
        let update = self
            .rx
            .wait_for(|update| update.status() == Some(status))
            .await
            .map_err(|_| ClientError::Backend(format!("order {} subscription closed", self.order_id)))?;
        Ok(update.clone())
    }
}
