//! Order document - the backend's copy of a placed order
//!
//! Remote snapshots are decoded leniently: every field has a default so a
//! partially written document still renders (zero totals, empty item lists,
//! placeholder names) instead of failing the subscription.

use super::status::{OrderStatus, OrderStatusView};
use super::types::CartLineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name shown for an item line that arrived without one
pub const PLACEHOLDER_ITEM_NAME: &str = "Unnamed item";

// ============================================================================
// Payment & Address
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Wallet,
    #[serde(other)]
    Unknown,
}

/// Delivery address snapshot taken at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DeliveryAddress {
    pub label: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// ============================================================================
// Fees
// ============================================================================

/// Fee breakdown stored on every order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FeeBreakdown {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub discount: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
}

impl FeeBreakdown {
    /// `total = subtotal + delivery_fee + service_fee + tip - discount`
    pub fn compute(
        subtotal: Decimal,
        delivery_fee: Decimal,
        service_fee: Decimal,
        tip: Decimal,
        discount: Decimal,
    ) -> Self {
        Self {
            subtotal,
            delivery_fee,
            service_fee,
            discount,
            tip,
            total: subtotal + delivery_fee + service_fee + tip - discount,
        }
    }
}

// ============================================================================
// Display Items
// ============================================================================

/// Uniform item line for panel rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DisplayItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Customization names, in the order they were chosen
    pub customizations: Vec<String>,
}

impl DisplayItem {
    fn from_line(line: &CartLineItem) -> Self {
        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_total(),
            customizations: line
                .customizations
                .iter()
                .map(|c| if c.name.is_empty() { c.id.clone() } else { c.name.clone() })
                .collect(),
        }
        .with_placeholders()
    }

    fn with_placeholders(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = PLACEHOLDER_ITEM_NAME.to_string();
        }
        if self.quantity == 0 {
            self.quantity = 1;
        }
        self
    }
}

// ============================================================================
// Order Document
// ============================================================================

/// Order as stored by the backend
///
/// `status` stays a raw string: the backend owns the vocabulary and the
/// client must tolerate values it does not know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OrderDocument {
    /// Durable id assigned by the backend
    pub id: String,
    /// Provisional id assigned by the client before the create call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<i64>,
    pub user_id: String,
    pub restaurant_id: String,
    /// Item snapshot copied from the cart at checkout
    pub items: Vec<CartLineItem>,
    /// Precomputed display list (written by some producers instead of `items`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub display_items: Vec<DisplayItem>,
    pub payment_method: PaymentMethod,
    pub fees: FeeBreakdown,
    pub eta_minutes: u32,
    pub courier_notes: String,
    pub delivery_address: DeliveryAddress,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderDocument {
    /// Decode a raw backend document keyed by `id`.
    ///
    /// `null` and missing fields take their defaults. A field with the wrong
    /// shape is reset to its default on its own; the rest of the document
    /// survives.
    pub fn from_raw(id: &str, raw: &Value) -> Self {
        let cleaned = without_nulls(raw);
        let mut doc = match serde_json::from_value::<OrderDocument>(cleaned.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "Malformed order document, dropping bad fields");
                Self::salvage(&cleaned)
            }
        };
        doc.id = id.to_string();
        doc
    }

    /// Keep only the top-level fields that decode on their own
    fn salvage(raw: &Value) -> Self {
        let Value::Object(map) = raw else {
            return Self::default();
        };
        let usable: Map<String, Value> = map
            .iter()
            .filter(|(key, value)| {
                let mut single = Map::new();
                single.insert((*key).clone(), (*value).clone());
                serde_json::from_value::<OrderDocument>(Value::Object(single)).is_ok()
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(usable)).unwrap_or_default()
    }

    /// Parsed status, `None` when the raw value is outside the vocabulary
    pub fn parsed_status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }

    /// User-facing status projection
    pub fn status_view(&self) -> OrderStatusView {
        OrderStatusView::project(&self.status)
    }

    /// Normalize the item lines into a single display list.
    ///
    /// A precomputed display list wins; otherwise the raw cart items are
    /// converted.
    pub fn display_lines(&self) -> Vec<DisplayItem> {
        if !self.display_items.is_empty() {
            return self
                .display_items
                .iter()
                .cloned()
                .map(DisplayItem::with_placeholders)
                .collect();
        }
        self.items.iter().map(DisplayItem::from_line).collect()
    }

    /// Total number of units across the item lines
    pub fn item_count(&self) -> u32 {
        total_quantity(&self.display_lines())
    }
}

/// Sum of line quantities, saturating at `u32::MAX`
pub fn total_quantity(lines: &[DisplayItem]) -> u32 {
    lines.iter().fold(0u32, |acc, line| acc.saturating_add(line.quantity))
}

/// Drop `null` object entries at every depth so field defaults apply
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}
