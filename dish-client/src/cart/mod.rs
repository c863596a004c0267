//! Cart aggregate - single-restaurant shopping cart
//!
//! The cart holds an ordered list of line items and an implicit restaurant
//! affinity, derived from the items rather than stored. The single-restaurant
//! rule is enforced only in [`CartAggregate::add_item`]:
//!
//! ```text
//! add_item(candidate)
//!     ├─ cart empty                    → add, tagged with resolved affinity
//!     ├─ cart affinity unknown,
//!     │  candidate known               → tag existing items, add
//!     ├─ affinities equal              → add (tag untagged items)
//!     └─ anything else                 → reject, publish LockNotice
//! ```
//!
//! Mutations are synchronous and never fail; rejections come back as
//! [`AddOutcome::Rejected`] and go out on the [`LockNotificationChannel`].

pub mod lock;

pub use lock::{LockNotice, LockNotificationChannel};

use rust_decimal::Decimal;
use serde::Serialize;
use shared::catalog::AffinityResolver;
use shared::order::{CartItemInput, CartLineItem, Customization};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

/// Result of [`CartAggregate::add_item`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// New line item appended with quantity 1
    Added,
    /// Matching line item incremented to `quantity`
    Incremented { quantity: u32 },
    /// Cross-restaurant conflict, cart untouched
    Rejected(LockNotice),
}

impl AddOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, AddOutcome::Rejected(_))
    }
}

/// Read-only view of the cart published after every mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub total_items: u32,
    pub total_price: Decimal,
    pub restaurant_id: Option<String>,
}

/// In-memory single-restaurant cart owned by the active session
#[derive(Debug)]
pub struct CartAggregate {
    items: Vec<CartLineItem>,
    resolver: AffinityResolver,
    lock: LockNotificationChannel,
    changes: watch::Sender<CartSnapshot>,
}

impl CartAggregate {
    pub fn new(resolver: AffinityResolver, lock: LockNotificationChannel) -> Self {
        let (changes, _) = watch::channel(CartSnapshot::default());
        Self {
            items: Vec::new(),
            resolver,
            lock,
            changes,
        }
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The lock notification channel this cart publishes on
    pub fn lock_channel(&self) -> &LockNotificationChannel {
        &self.lock
    }

    /// Subscribe to conflict notices
    pub fn subscribe_locks(&self) -> broadcast::Receiver<LockNotice> {
        self.lock.subscribe()
    }

    /// Subscribe to cart snapshots (current value available immediately)
    pub fn subscribe_changes(&self) -> watch::Receiver<CartSnapshot> {
        self.changes.subscribe()
    }

    /// Restaurant the cart is locked to.
    ///
    /// An explicitly tagged item wins; otherwise the catalog is asked about
    /// each item key in order.
    pub fn restaurant_affinity(&self) -> Option<String> {
        self.items
            .iter()
            .find_map(|item| self.resolver.tag_of(item))
            .or_else(|| {
                self.items
                    .iter()
                    .find_map(|item| self.resolver.from_catalog(&item.id))
            })
    }

    /// Add one unit of `input`, enforcing restaurant affinity
    pub fn add_item(&mut self, input: CartItemInput) -> AddOutcome {
        let incoming = self.resolver.resolve(&input);

        if !self.items.is_empty() {
            let current = self.restaurant_affinity();
            let compatible = match (&current, &incoming) {
                (Some(cart), Some(requested)) => cart == requested,
                (None, Some(_)) => true,
                _ => false,
            };
            if !compatible {
                return self.reject(&input.id, current, incoming);
            }
            if let Some(restaurant) = &incoming {
                self.promote_affinity(restaurant);
            }
        }

        let outcome = match self.position(&input.id, &input.customizations) {
            Some(pos) => {
                let item = &mut self.items[pos];
                item.quantity = item.quantity.saturating_add(1);
                AddOutcome::Incremented {
                    quantity: item.quantity,
                }
            }
            None => {
                self.items.push(CartLineItem::from_input(input, incoming));
                AddOutcome::Added
            }
        };

        debug!(outcome = ?outcome, total_items = self.total_items(), "Cart item added");
        self.publish();
        outcome
    }

    /// Remove the line matching `id` + `customizations`
    pub fn remove_item(&mut self, id: &str, customizations: &[Customization]) -> Option<CartLineItem> {
        let pos = self.position(id, customizations)?;
        let removed = self.items.remove(pos);
        debug!(item_id = %id, "Cart item removed");
        self.publish();
        Some(removed)
    }

    /// Increment the matching line; `false` when nothing matched
    pub fn increase_qty(&mut self, id: &str, customizations: &[Customization]) -> bool {
        let Some(pos) = self.position(id, customizations) else {
            return false;
        };
        let item = &mut self.items[pos];
        item.quantity = item.quantity.saturating_add(1);
        self.publish();
        true
    }

    /// Decrement the matching line, removing it when it reaches zero
    pub fn decrease_qty(&mut self, id: &str, customizations: &[Customization]) -> bool {
        let Some(pos) = self.position(id, customizations) else {
            return false;
        };
        if self.items[pos].quantity <= 1 {
            self.items.remove(pos);
            debug!(item_id = %id, "Cart item removed at zero quantity");
        } else {
            self.items[pos].quantity -= 1;
        }
        self.publish();
        true
    }

    /// Empty the cart; the only way out of a cross-restaurant lock
    pub fn clear_cart(&mut self) {
        self.items.clear();
        debug!("Cart cleared");
        self.publish();
    }

    /// Sum of quantities across all lines
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum over lines of `quantity × (unit_price + Σ customization.price)`
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total()))
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total_items: self.total_items(),
            total_price: self.total_price(),
            restaurant_id: self.restaurant_affinity(),
        }
    }

    fn position(&self, id: &str, customizations: &[Customization]) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.matches(id, customizations))
    }

    /// Tag every untagged line with `restaurant`
    fn promote_affinity(&mut self, restaurant: &str) {
        let mut promoted = 0usize;
        for item in self.items.iter_mut().filter(|i| i.restaurant_id.is_none()) {
            item.restaurant_id = Some(restaurant.to_string());
            promoted += 1;
        }
        if promoted > 0 {
            debug!(restaurant_id = %restaurant, promoted, "Cart affinity promoted");
        }
    }

    fn reject(
        &self,
        item_id: &str,
        current: Option<String>,
        incoming: Option<String>,
    ) -> AddOutcome {
        let notice = LockNotice::new(item_id, current, incoming);
        warn!(
            item_id = %item_id,
            cart_restaurant = ?notice.cart_restaurant,
            requested_restaurant = ?notice.requested_restaurant,
            "Cart add rejected: restaurant lock"
        );
        self.lock.publish(notice.clone());
        AddOutcome::Rejected(notice)
    }

    fn publish(&self) {
        self.changes.send_replace(self.snapshot());
    }
}
