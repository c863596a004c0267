//! Cart item types and customization identity

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Customization
// ============================================================================

/// Add-on or variant chosen for a line item
///
/// Equality is by `id` only; name and price are display data.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Customization {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

impl Customization {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

impl PartialEq for Customization {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Customization {}

/// Order-independent comparison of two customization sets
///
/// Lengths are checked first, then the sorted id lists are compared
/// element-wise, so multiplicity counts: `[a, a, b]` differs from `[a, b, b]`.
pub fn customizations_equal(a: &[Customization], b: &[Customization]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&str> = a.iter().map(|c| c.id.as_str()).collect();
    let mut right: Vec<&str> = b.iter().map(|c| c.id.as_str()).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Sum of customization prices
///
/// Saturates at the `Decimal` bounds; prices may come from remote documents.
pub fn customizations_price(customizations: &[Customization]) -> Decimal {
    customizations
        .iter()
        .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.price))
}

// ============================================================================
// Cart Item Input
// ============================================================================

/// Nested restaurant reference carried by some menu items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct RestaurantRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Cart item input - the candidate handed to `add_item`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CartItemInput {
    /// Item identity key
    pub id: String,
    pub name: String,
    /// Unit price before customizations
    pub price: Decimal,
    pub customizations: Vec<Customization>,
    /// Explicit restaurant tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    /// Nested restaurant reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<RestaurantRef>,
}

impl CartItemInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    /// Set the explicit restaurant tag
    pub fn with_restaurant_id(mut self, restaurant_id: impl Into<String>) -> Self {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    /// Set the nested restaurant reference
    pub fn with_restaurant(mut self, restaurant: RestaurantRef) -> Self {
        self.restaurant = Some(restaurant);
        self
    }

    pub fn with_customizations(mut self, customizations: Vec<Customization>) -> Self {
        self.customizations = customizations;
        self
    }
}

// ============================================================================
// Cart Line Item
// ============================================================================

/// One distinct purchasable entry in the cart
///
/// Identity is `id` plus the customization set (see [`customizations_equal`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CartLineItem {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    /// Always >= 1 while the item is in a cart
    pub quantity: u32,
    pub customizations: Vec<Customization>,
    /// Restaurant affinity tag (normalized)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
}

impl Default for CartLineItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            unit_price: Decimal::ZERO,
            quantity: 1,
            customizations: Vec::new(),
            restaurant_id: None,
        }
    }
}

impl CartLineItem {
    /// Build a quantity-1 line from a candidate, tagged with the resolved affinity
    pub fn from_input(input: CartItemInput, restaurant_id: Option<String>) -> Self {
        Self {
            id: input.id,
            name: input.name,
            unit_price: input.price,
            quantity: 1,
            customizations: input.customizations,
            restaurant_id,
        }
    }

    /// Whether this line is the merge slot for `id` + `customizations`
    pub fn matches(&self, id: &str, customizations: &[Customization]) -> bool {
        self.id == id && customizations_equal(&self.customizations, customizations)
    }

    /// Unit price including customizations
    pub fn unit_total(&self) -> Decimal {
        self.unit_price
            .saturating_add(customizations_price(&self.customizations))
    }

    /// `quantity × (unit_price + Σ customization.price)`
    pub fn line_total(&self) -> Decimal {
        self.unit_total().saturating_mul(Decimal::from(self.quantity))
    }
}
