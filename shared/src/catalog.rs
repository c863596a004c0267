//! Restaurant affinity resolution
//!
//! Maps a cart candidate to a normalized restaurant identity. Precedence:
//!
//! 1. explicit `restaurant_id` tag on the item
//! 2. nested `restaurant` reference
//! 3. reverse lookup of the item key in the [`ItemCatalog`]
//! 4. unknown (`None`)
//!
//! Everything here is pure; the cart aggregate owns the policy built on top.

use crate::order::{CartItemInput, CartLineItem};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Item Catalog
// ============================================================================

/// Item identity key -> restaurant identity
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<String, String>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load from a JSON object of `{"item-key": "restaurant-id"}`
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let items: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { items })
    }

    pub fn insert(&mut self, item_key: impl Into<String>, restaurant_id: impl Into<String>) {
        self.items.insert(item_key.into(), restaurant_id.into());
    }

    pub fn restaurant_for(&self, item_key: &str) -> Option<&str> {
        self.items.get(item_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// Restaurant Aliases
// ============================================================================

/// Folds known spellings of a restaurant onto one canonical key
///
/// Spellings are compared by their fold key (lower-case alphanumerics only),
/// so "Ada Pizza", "ada-pizza" and "ADA_PIZZA" are the same restaurant.
#[derive(Debug, Clone, Default)]
pub struct RestaurantAliases {
    by_fold: HashMap<String, String>,
}

impl RestaurantAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canonical key and any extra spellings that should fold to it
    pub fn register<I, S>(&mut self, canonical: impl Into<String>, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = canonical.into();
        self.by_fold.insert(fold_key(&canonical), canonical.clone());
        for alias in aliases {
            self.by_fold.insert(fold_key(alias.as_ref()), canonical.clone());
        }
    }

    pub fn with_restaurant<I, S>(mut self, canonical: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(canonical, aliases);
        self
    }

    /// Normalize a raw restaurant identity; blank input yields `None`.
    ///
    /// Unknown inputs are lower-cased and stripped of whitespace.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(canonical) = self.by_fold.get(&fold_key(trimmed)) {
            return Some(canonical.clone());
        }
        Some(
            trimmed
                .chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect(),
        )
    }
}

fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// Affinity Resolver
// ============================================================================

/// Resolves candidates and cart lines to a normalized restaurant identity
#[derive(Debug, Clone, Default)]
pub struct AffinityResolver {
    catalog: Arc<ItemCatalog>,
    aliases: Arc<RestaurantAliases>,
}

impl AffinityResolver {
    pub fn new(catalog: ItemCatalog, aliases: RestaurantAliases) -> Self {
        Self {
            catalog: Arc::new(catalog),
            aliases: Arc::new(aliases),
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Resolve a candidate: explicit tag, nested reference, catalog, unknown
    pub fn resolve(&self, input: &CartItemInput) -> Option<String> {
        input
            .restaurant_id
            .as_deref()
            .and_then(|tag| self.aliases.normalize(tag))
            .or_else(|| {
                input
                    .restaurant
                    .as_ref()
                    .and_then(|r| self.aliases.normalize(&r.id))
            })
            .or_else(|| self.from_catalog(&input.id))
    }

    /// Explicit tag of a cart line, if any
    pub fn tag_of(&self, line: &CartLineItem) -> Option<String> {
        line.restaurant_id
            .as_deref()
            .and_then(|tag| self.aliases.normalize(tag))
    }

    /// Reverse lookup of an item key in the catalog
    pub fn from_catalog(&self, item_key: &str) -> Option<String> {
        self.catalog
            .restaurant_for(item_key)
            .and_then(|r| self.aliases.normalize(r))
    }

    /// Normalize a raw restaurant identity
    pub fn normalize(&self, raw: &str) -> Option<String> {
        self.aliases.normalize(raw)
    }
}
