//! Order Backend port
//!
//! The remote document store seen from the client: create an order, watch a
//! single order document, watch a restaurant's orders filtered by status, and
//! set an order's status. Live queries are push-driven: the listener fires
//! once with the initial snapshot and again on every remote change until the
//! returned [`Subscription`] is cancelled or dropped.

pub mod memory;

pub use memory::InMemoryOrderBackend;

use crate::checkout::OrderDraft;
use crate::error::ClientResult;
use async_trait::async_trait;
use serde_json::Value;
use shared::order::OrderStatus;
use std::fmt;
use std::sync::Arc;

/// A raw backend document and its key
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Value,
}

/// Listener for a single document; `None` when the document does not exist
pub type DocumentListener = Arc<dyn Fn(Option<DocumentSnapshot>) + Send + Sync>;

/// Listener for a live query; each call carries the full result set
pub type QueryListener = Arc<dyn Fn(Vec<DocumentSnapshot>) + Send + Sync>;

/// Remote order store
#[async_trait]
pub trait OrderBackend: Send + Sync + 'static {
    /// Create an order document, returning its durable id
    async fn create_order(&self, draft: &OrderDraft) -> ClientResult<String>;

    /// Watch one order document
    fn subscribe_order_document(&self, order_id: &str, on_change: DocumentListener) -> Subscription;

    /// Watch a restaurant's orders whose status is in `statuses`
    fn subscribe_orders_by_restaurant_and_status(
        &self,
        restaurant_id: &str,
        statuses: &[OrderStatus],
        on_change: QueryListener,
    ) -> Subscription;

    /// Set the status of an order
    async fn set_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<()>;
}

/// Cancellation handle for a live subscription
///
/// Cancelling detaches the listener; dropping the handle cancels too, so an
/// owner that goes away cannot leak a live listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to detach
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Detach the subscription
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cancel_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = Subscription::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(sub.is_active());
        sub.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        {
            let _sub = Subscription::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inert_subscription() {
        let sub = Subscription::inert();
        assert!(!sub.is_active());
        sub.cancel();
    }
}
