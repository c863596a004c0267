//! In-memory Order Backend
//!
//! A process-local document store implementing [`OrderBackend`]. Listeners are
//! invoked synchronously on the writing thread, after the store lock has been
//! released, so a listener may call back into the backend.
//!
//! Writes and their deliveries are serialized by a reentrant delivery gate:
//! concurrent writers fire in write order, and a subscribe's initial snapshot
//! is never overtaken by a later change. A listener that writes from inside
//! its callback is delivered to before the outer write's remaining listeners.
//!
//! Used by tests and demos; it also documents the delivery contract a real
//! transport has to honour (initial snapshot on subscribe, full result set on
//! every change, `None` for a missing document).

use super::{DocumentListener, DocumentSnapshot, OrderBackend, QueryListener, Subscription};
use crate::checkout::OrderDraft;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use shared::order::OrderStatus;
use shared::util::now_millis;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

struct QueryRegistration {
    restaurant_id: String,
    statuses: Vec<OrderStatus>,
    listener: QueryListener,
}

impl QueryRegistration {
    fn matches(&self, data: &Value) -> bool {
        let restaurant = data.get("restaurant_id").and_then(Value::as_str);
        let status = data.get("status").and_then(Value::as_str);
        restaurant == Some(self.restaurant_id.as_str())
            && status.is_some_and(|s| self.statuses.iter().any(|st| st.as_str() == s))
    }
}

#[derive(Default)]
struct State {
    documents: HashMap<String, Value>,
    document_listeners: BTreeMap<u64, (String, DocumentListener)>,
    query_listeners: BTreeMap<u64, QueryRegistration>,
    next_listener_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_listener_id += 1;
        self.next_listener_id
    }

    fn snapshot_of(&self, id: &str) -> Option<DocumentSnapshot> {
        self.documents.get(id).map(|data| DocumentSnapshot {
            id: id.to_string(),
            data: data.clone(),
        })
    }

    /// Result set of a query, oldest order first
    fn query(&self, registration: &QueryRegistration) -> Vec<DocumentSnapshot> {
        let mut results: Vec<DocumentSnapshot> = self
            .documents
            .iter()
            .filter(|(_, data)| registration.matches(data))
            .map(|(id, data)| DocumentSnapshot {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();
        results.sort_by(|a, b| {
            let created = |d: &DocumentSnapshot| d.data.get("created_at").and_then(Value::as_i64);
            created(a).cmp(&created(b)).then_with(|| a.id.cmp(&b.id))
        });
        results
    }
}

/// Deliveries collected under the lock and fired after it is released
#[derive(Default)]
struct Deliveries {
    documents: Vec<(DocumentListener, Option<DocumentSnapshot>)>,
    queries: Vec<(QueryListener, Vec<DocumentSnapshot>)>,
}

impl Deliveries {
    fn fire(self) {
        for (listener, snapshot) in self.documents {
            listener(snapshot);
        }
        for (listener, results) in self.queries {
            listener(results);
        }
    }
}

struct Inner {
    state: Mutex<State>,
    /// Held from a write until its deliveries have fired
    delivery: ReentrantMutex<()>,
    offline: AtomicBool,
}

/// Process-local order document store
#[derive(Clone)]
pub struct InMemoryOrderBackend {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryOrderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("InMemoryOrderBackend")
            .field("documents", &state.documents.len())
            .field("document_listeners", &state.document_listeners.len())
            .field("query_listeners", &state.query_listeners.len())
            .field("offline", &self.inner.offline.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for InMemoryOrderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                delivery: ReentrantMutex::new(()),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Simulate an unreachable backend: writes fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw copy of a stored document
    pub fn document(&self, id: &str) -> Option<Value> {
        self.inner.state.lock().documents.get(id).cloned()
    }

    /// Insert or replace a raw document (another producer writing the store)
    pub fn put_document(&self, id: impl Into<String>, data: Value) {
        let id = id.into();
        self.apply(|state| {
            let old = state.documents.insert(id.clone(), data.clone());
            ((), collect_deliveries(state, &id, old.as_ref(), Some(&data)))
        });
    }

    /// Delete a document; its watchers see it disappear
    pub fn delete_document(&self, id: &str) -> Option<Value> {
        self.apply(|state| {
            let old = state.documents.remove(id);
            let deliveries = collect_deliveries(state, id, old.as_ref(), None);
            (old, deliveries)
        })
    }

    /// Number of live listeners (documents + queries)
    pub fn listener_count(&self) -> usize {
        let state = self.inner.state.lock();
        state.document_listeners.len() + state.query_listeners.len()
    }

    /// Run a change under the store lock, then fire its deliveries in order
    fn apply<R>(&self, change: impl FnOnce(&mut State) -> (R, Deliveries)) -> R {
        let _gate = self.inner.delivery.lock();
        let (result, deliveries) = {
            let mut state = self.inner.state.lock();
            change(&mut state)
        };
        deliveries.fire();
        result
    }

    fn write_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<()> {
        self.apply(|state| {
            let Some(data) = state.documents.get_mut(order_id) else {
                return (
                    Err(ClientError::NotFound(format!("order {order_id}"))),
                    Deliveries::default(),
                );
            };
            let old = data.clone();
            if let Value::Object(map) = data {
                map.insert("status".to_string(), Value::String(status.as_str().to_string()));
                map.insert("updated_at".to_string(), Value::from(now_millis()));
            }
            let new = data.clone();
            (Ok(()), collect_deliveries(state, order_id, Some(&old), Some(&new)))
        })
    }

    fn ensure_online(&self) -> ClientResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("backend unavailable".to_string()));
        }
        Ok(())
    }

    fn cancel_handle(&self, listener_id: u64, query: bool) -> Subscription {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut state = inner.state.lock();
                if query {
                    state.query_listeners.remove(&listener_id);
                } else {
                    state.document_listeners.remove(&listener_id);
                }
            }
        })
    }
}

/// Collect the listeners affected by a change of document `id`
fn collect_deliveries(state: &State, id: &str, old: Option<&Value>, new: Option<&Value>) -> Deliveries {
    let documents = state
        .document_listeners
        .values()
        .filter(|(doc_id, _)| doc_id == id)
        .map(|(_, listener)| (listener.clone(), state.snapshot_of(id)))
        .collect();

    let restaurant_of = |v: Option<&Value>| {
        v.and_then(|d| d.get("restaurant_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let restaurants = [restaurant_of(old), restaurant_of(new)];

    let queries = state
        .query_listeners
        .values()
        .filter(|reg| restaurants.iter().flatten().any(|r| *r == reg.restaurant_id))
        .map(|reg| (reg.listener.clone(), state.query(reg)))
        .collect();

    Deliveries { documents, queries }
}

#[async_trait]
impl OrderBackend for InMemoryOrderBackend {
    async fn create_order(&self, draft: &OrderDraft) -> ClientResult<String> {
        self.ensure_online()?;
        let id = uuid::Uuid::new_v4().to_string();
        let mut data = serde_json::to_value(draft)?;
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(id.clone()));
            map.insert("updated_at".to_string(), Value::from(now_millis()));
        }
        tracing::debug!(order_id = %id, restaurant_id = %draft.restaurant_id, "Order document created");
        self.put_document(id.clone(), data);
        Ok(id)
    }

    fn subscribe_order_document(&self, order_id: &str, on_change: DocumentListener) -> Subscription {
        let listener_id = self.apply(|state| {
            let listener_id = state.next_id();
            state
                .document_listeners
                .insert(listener_id, (order_id.to_string(), on_change.clone()));
            let initial = Deliveries {
                documents: vec![(on_change, state.snapshot_of(order_id))],
                queries: Vec::new(),
            };
            (listener_id, initial)
        });
        self.cancel_handle(listener_id, false)
    }

    fn subscribe_orders_by_restaurant_and_status(
        &self,
        restaurant_id: &str,
        statuses: &[OrderStatus],
        on_change: QueryListener,
    ) -> Subscription {
        let listener_id = self.apply(|state| {
            let listener_id = state.next_id();
            let registration = QueryRegistration {
                restaurant_id: restaurant_id.to_string(),
                statuses: statuses.to_vec(),
                listener: on_change.clone(),
            };
            let initial = Deliveries {
                documents: Vec::new(),
                queries: vec![(on_change, state.query(&registration))],
            };
            state.query_listeners.insert(listener_id, registration);
            (listener_id, initial)
        });
        self.cancel_handle(listener_id, true)
    }

    async fn set_order_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<()> {
        self.ensure_online()?;
        self.write_status(order_id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<Option<DocumentSnapshot>>>>, DocumentListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Arc::new(move |snap: Option<DocumentSnapshot>| sink.lock().push(snap)))
    }

    fn query_recorder() -> (Arc<Mutex<Vec<Vec<String>>>>, QueryListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (
            seen,
            Arc::new(move |docs: Vec<DocumentSnapshot>| {
                sink.lock().push(docs.into_iter().map(|d| d.id).collect())
            }),
        )
    }

    fn order(restaurant: &str, status: &str, created_at: i64) -> Value {
        json!({ "restaurant_id": restaurant, "status": status, "created_at": created_at })
    }

    #[tokio::test]
    async fn test_document_subscription_initial_and_updates() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));

        let (seen, listener) = recorder();
        let _sub = backend.subscribe_order_document("o1", listener);
        backend.set_order_status("o1", OrderStatus::Accepted).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].as_ref().unwrap().data["status"], "pending");
        assert_eq!(seen[1].as_ref().unwrap().data["status"], "accepted");
    }

    #[tokio::test]
    async fn test_missing_document_delivers_none() {
        let backend = InMemoryOrderBackend::new();
        let (seen, listener) = recorder();
        let _sub = backend.subscribe_order_document("ghost", listener);
        assert_eq!(seen.lock().as_slice(), &[None]);
    }

    #[tokio::test]
    async fn test_cancel_detaches_listener() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));
        let (seen, listener) = recorder();
        let sub = backend.subscribe_order_document("o1", listener);
        assert_eq!(backend.listener_count(), 1);

        sub.cancel();
        assert_eq!(backend.listener_count(), 0);
        backend.set_order_status("o1", OrderStatus::Accepted).await.unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_by_restaurant_and_status() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));
        backend.put_document("o2", order("ada-pizza", "delivered", 2));
        backend.put_document("o3", order("lombard-kitchen", "pending", 3));
        backend.put_document("o4", order("ada-pizza", "accepted", 4));

        let (seen, listener) = query_recorder();
        let _sub = backend.subscribe_orders_by_restaurant_and_status(
            "ada-pizza",
            &OrderStatus::IN_FLIGHT,
            listener,
        );
        assert_eq!(seen.lock()[0], vec!["o1", "o4"]);

        // o1 leaves the in-flight set
        backend.set_order_status("o1", OrderStatus::Rejected).await.unwrap();
        assert_eq!(seen.lock().last().unwrap(), &vec!["o4".to_string()]);

        // Another restaurant's change does not reach this query
        let deliveries = seen.lock().len();
        backend.set_order_status("o3", OrderStatus::Accepted).await.unwrap();
        assert_eq!(seen.lock().len(), deliveries);
    }

    #[tokio::test]
    async fn test_offline_backend_rejects_writes() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));
        backend.set_offline(true);
        let err = backend
            .set_order_status("o1", OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Backend(_)));
        assert_eq!(backend.document("o1").unwrap()["status"], "pending");

        backend.set_offline(false);
        backend.set_order_status("o1", OrderStatus::Accepted).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_status_on_missing_document() {
        let backend = InMemoryOrderBackend::new();
        let err = backend
            .set_order_status("ghost", OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn test_concurrent_writers_deliver_in_write_order() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", json!({ "seq": 0 }));

        // Each delivery must carry what the store holds at that moment
        let stale = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None::<Value>));
        let (store, stale_count, last_seen) = (backend.clone(), stale.clone(), last.clone());
        let _sub = backend.subscribe_order_document(
            "o1",
            Arc::new(move |snap: Option<DocumentSnapshot>| {
                let data = snap.map(|s| s.data);
                if data != store.document("o1") {
                    stale_count.fetch_add(1, Ordering::SeqCst);
                }
                *last_seen.lock() = data;
            }),
        );

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let backend = backend.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        backend.put_document("o1", json!({ "seq": t * 100 + i }));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(stale.load(Ordering::SeqCst), 0);
        assert_eq!(*last.lock(), backend.document("o1"));
    }

    #[tokio::test]
    async fn test_listener_may_write_back_into_backend() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));
        let writer = backend.clone();
        let _sub = backend.subscribe_order_document(
            "o1",
            Arc::new(move |snap: Option<DocumentSnapshot>| {
                if snap.is_some_and(|s| s.data["status"] == "accepted") {
                    writer.put_document("audit", json!({ "seen": true }));
                }
            }),
        );
        backend.set_order_status("o1", OrderStatus::Accepted).await.unwrap();
        assert_eq!(backend.document("audit").unwrap()["seen"], true);
    }

    #[tokio::test]
    async fn test_delete_notifies_watchers_with_none() {
        let backend = InMemoryOrderBackend::new();
        backend.put_document("o1", order("ada-pizza", "pending", 1));
        let (seen, listener) = recorder();
        let _sub = backend.subscribe_order_document("o1", listener);
        assert!(backend.delete_document("o1").is_some());
        assert_eq!(seen.lock().last().unwrap(), &None);
    }
}
