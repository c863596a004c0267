//! Restaurant order feed - the restaurant's live order board
//!
//! Watches one restaurant's orders filtered to a status allow-list. Each
//! backend snapshot replaces the whole result set; the feed never diffs.
//! Status transitions go through [`RestaurantOrderFeed::transition_order`],
//! which reports failures as a feed-level error string instead of returning
//! them.

use crate::backend::{DocumentSnapshot, OrderBackend, Subscription};
use crate::error::ClientError;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::order::{DisplayItem, OrderDocument, OrderStatus, OrderStatusView, total_quantity};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Preset status filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Orders the kitchen still has to act on
    InFlight,
    /// Finished orders
    History,
}

impl FeedKind {
    pub fn statuses(&self) -> &'static [OrderStatus] {
        match self {
            FeedKind::InFlight => &OrderStatus::IN_FLIGHT,
            FeedKind::History => &OrderStatus::HISTORY,
        }
    }
}

/// One order normalized for the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedOrder {
    pub id: String,
    /// Raw backend status
    pub status: String,
    pub view: OrderStatusView,
    pub lines: Vec<DisplayItem>,
    pub item_count: u32,
    pub total: Decimal,
    pub created_at: i64,
    pub document: OrderDocument,
}

impl FeedOrder {
    pub fn from_document(document: OrderDocument) -> Self {
        let lines = document.display_lines();
        Self {
            id: document.id.clone(),
            status: document.status.clone(),
            view: document.status_view(),
            item_count: total_quantity(&lines),
            lines,
            total: document.fees.total,
            created_at: document.created_at,
            document,
        }
    }

    fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        Self::from_document(OrderDocument::from_raw(&snapshot.id, &snapshot.data))
    }

    pub fn parsed_status(&self) -> Option<OrderStatus> {
        self.document.parsed_status()
    }
}

/// Current contents of a feed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedState {
    pub orders: Vec<FeedOrder>,
    /// Last transition failure, cleared by the next successful transition
    pub error: Option<String>,
}

/// Live order board for one restaurant
pub struct RestaurantOrderFeed {
    backend: Arc<dyn OrderBackend>,
    restaurant_id: String,
    statuses: Vec<OrderStatus>,
    state: Arc<watch::Sender<FeedState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl std::fmt::Debug for RestaurantOrderFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestaurantOrderFeed")
            .field("restaurant_id", &self.restaurant_id)
            .field("statuses", &self.statuses)
            .field("running", &self.is_running())
            .finish()
    }
}

impl RestaurantOrderFeed {
    pub fn new(
        backend: Arc<dyn OrderBackend>,
        restaurant_id: impl Into<String>,
        statuses: &[OrderStatus],
    ) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            backend,
            restaurant_id: restaurant_id.into(),
            statuses: statuses.to_vec(),
            state: Arc::new(state),
            subscription: Mutex::new(None),
        }
    }

    pub fn for_kind(backend: Arc<dyn OrderBackend>, restaurant_id: impl Into<String>, kind: FeedKind) -> Self {
        Self::new(backend, restaurant_id, kind.statuses())
    }

    pub fn restaurant_id(&self) -> &str {
        &self.restaurant_id
    }

    pub fn statuses(&self) -> &[OrderStatus] {
        &self.statuses
    }

    /// Start the live query; a running feed is left as is
    pub fn start(&self) {
        let mut guard = self.subscription.lock();
        if guard.is_some() {
            return;
        }

        let state = self.state.clone();
        let restaurant_id = self.restaurant_id.clone();
        let subscription = self.backend.subscribe_orders_by_restaurant_and_status(
            &self.restaurant_id,
            &self.statuses,
            Arc::new(move |snapshots: Vec<DocumentSnapshot>| {
                let orders: Vec<FeedOrder> = snapshots.iter().map(FeedOrder::from_snapshot).collect();
                debug!(restaurant_id = %restaurant_id, count = orders.len(), "Order feed snapshot");
                state.send_modify(|s| s.orders = orders);
            }),
        );
        *guard = Some(subscription);
        info!(restaurant_id = %self.restaurant_id, statuses = ?self.statuses, "Order feed started");
    }

    /// Cancel the live query; the last result set stays readable
    pub fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
            info!(restaurant_id = %self.restaurant_id, "Order feed stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn orders(&self) -> Vec<FeedOrder> {
        self.state.borrow().orders.clone()
    }

    pub fn order(&self, order_id: &str) -> Option<FeedOrder> {
        self.state.borrow().orders.iter().find(|o| o.id == order_id).cloned()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Move an order to `next`.
    ///
    /// Returns `true` when the backend accepted the change. A backwards move
    /// for an order on this board is refused without calling the backend;
    /// orders not on the board are passed straight through. Failures land in
    /// [`FeedState::error`].
    pub async fn transition_order(&self, order_id: &str, next: OrderStatus) -> bool {
        let current = self.order(order_id).and_then(|o| o.parsed_status());

        if let Some(Err(e)) = current.map(|from| from.transition_to(next)) {
            let err = ClientError::from(e);
            warn!(order_id = %order_id, error = %err, "Order transition refused");
            self.set_error(err.to_string());
            return false;
        }

        match self.backend.set_order_status(order_id, next).await {
            Ok(()) => {
                let from = current.map_or("unknown", |s| s.as_str());
                crate::order_audit!(order_id, "transition", format!("{from} -> {next}"));
                info!(order_id = %order_id, from, to = %next, "Order transitioned");
                self.clear_error();
                true
            }
            Err(e) => {
                warn!(order_id = %order_id, to = %next, error = %e, "Order transition failed");
                self.set_error(format!("Could not update order {order_id}: {e}"));
                false
            }
        }
    }

    fn set_error(&self, message: String) {
        self.state.send_modify(|s| s.error = Some(message));
    }
}

impl Drop for RestaurantOrderFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryOrderBackend;
    use serde_json::json;

    fn setup(kind: FeedKind) -> (InMemoryOrderBackend, RestaurantOrderFeed) {
        let backend = InMemoryOrderBackend::new();
        backend.put_document(
            "o1",
            json!({
                "restaurant_id": "ada-pizza",
                "status": "pending",
                "created_at": 1,
                "items": [{ "id": "burger-1", "name": "Burger", "unit_price": 50, "quantity": 2 }],
                "fees": { "total": 102 }
            }),
        );
        backend.put_document(
            "o2",
            json!({
                "restaurant_id": "ada-pizza",
                "status": "accepted",
                "created_at": 2,
                "display_items": [{ "name": "Margherita", "quantity": 1, "unit_price": 80 }]
            }),
        );
        backend.put_document(
            "o3",
            json!({ "restaurant_id": "ada-pizza", "status": "delivered", "created_at": 3 }),
        );
        backend.put_document(
            "o4",
            json!({ "restaurant_id": "lombard-kitchen", "status": "pending", "created_at": 4 }),
        );
        let feed = RestaurantOrderFeed::for_kind(Arc::new(backend.clone()), "ada-pizza", kind);
        (backend, feed)
    }

    fn ids(feed: &RestaurantOrderFeed) -> Vec<String> {
        feed.orders().into_iter().map(|o| o.id).collect()
    }

    #[tokio::test]
    async fn test_in_flight_feed_normalizes_lines() {
        let (_backend, feed) = setup(FeedKind::InFlight);
        feed.start();

        let orders = feed.orders();
        assert_eq!(ids(&feed), vec!["o1", "o2"]);
        assert_eq!(orders[0].lines[0].name, "Burger");
        assert_eq!(orders[0].item_count, 2);
        assert_eq!(orders[0].total, Decimal::from(102));
        assert_eq!(orders[1].lines[0].name, "Margherita");
        assert_eq!(orders[1].view, OrderStatusView::Confirmed);
    }

    #[tokio::test]
    async fn test_history_feed() {
        let (_backend, feed) = setup(FeedKind::History);
        feed.start();
        assert_eq!(ids(&feed), vec!["o3"]);
    }

    #[tokio::test]
    async fn test_snapshot_replaces_result_set() {
        let (backend, feed) = setup(FeedKind::InFlight);
        feed.start();

        assert!(feed.transition_order("o1", OrderStatus::Rejected).await);
        assert_eq!(ids(&feed), vec!["o2"]);

        backend.delete_document("o2");
        assert!(feed.orders().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_feed_error() {
        let (backend, feed) = setup(FeedKind::InFlight);
        feed.start();
        backend.set_offline(true);

        assert!(!feed.transition_order("o1", OrderStatus::Accepted).await);
        let error = feed.error().unwrap();
        assert!(error.contains("o1"));
        assert_eq!(feed.order("o1").unwrap().status, "pending");

        backend.set_offline(false);
        assert!(feed.transition_order("o1", OrderStatus::Accepted).await);
        assert_eq!(feed.error(), None);
        assert_eq!(feed.order("o1").unwrap().status, "accepted");
    }

    #[tokio::test]
    async fn test_backwards_transition_refused_locally() {
        let (backend, feed) = setup(FeedKind::InFlight);
        feed.start();

        assert!(!feed.transition_order("o2", OrderStatus::Pending).await);
        assert!(feed.error().unwrap().contains("accepted"));
        assert_eq!(backend.document("o2").unwrap()["status"], "accepted");
    }

    #[tokio::test]
    async fn test_unknown_order_passes_through_to_backend() {
        let (_backend, feed) = setup(FeedKind::InFlight);
        feed.start();
        assert!(!feed.transition_order("ghost", OrderStatus::Accepted).await);
        assert!(feed.error().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn test_stop_keeps_last_result_and_detaches() {
        let (backend, feed) = setup(FeedKind::InFlight);
        feed.start();
        feed.start();
        assert_eq!(backend.listener_count(), 1);

        feed.stop();
        assert!(!feed.is_running());
        assert_eq!(backend.listener_count(), 0);

        backend.set_order_status("o1", OrderStatus::Accepted).await.unwrap();
        assert_eq!(feed.order("o1").unwrap().status, "pending");
    }

    #[tokio::test]
    async fn test_bad_remote_data_does_not_break_the_board() {
        let (backend, feed) = setup(FeedKind::InFlight);
        backend.put_document(
            "o5",
            json!({
                "restaurant_id": "ada-pizza",
                "status": "pending",
                "created_at": 5,
                "courier_notes": null,
                "fees": { "total": 40 },
                "display_items": [{ "quantity": 4_000_000_000u32 }, { "quantity": 4_000_000_000u32 }]
            }),
        );
        feed.start();

        let order = feed.order("o5").unwrap();
        assert_eq!(order.item_count, u32::MAX);
        assert_eq!(order.total, Decimal::from(40));
        assert!(feed.transition_order("o5", OrderStatus::Accepted).await);
        assert_eq!(feed.order("o5").unwrap().status, "accepted");
    }

    #[tokio::test]
    async fn test_subscribers_see_state_changes() {
        let (_backend, feed) = setup(FeedKind::InFlight);
        let mut rx = feed.subscribe();
        feed.start();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().orders.len(), 2);
    }
}
