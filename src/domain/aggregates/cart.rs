//! Guest Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{LineKey, Quantity};

pub const CART_SCHEMA_VERSION: u32 = 1;

fn current_schema() -> u32 { CART_SCHEMA_VERSION }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCart")]
pub struct GuestCart {
    schema_version: u32,
    items: Vec<GuestCartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Persisted shape. Lines sharing an identity (left by another writer) are
/// merged on load so every identity maps to exactly one line.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCart {
    #[serde(default = "current_schema")]
    schema_version: u32,
    items: Vec<GuestCartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoredCart> for GuestCart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Self {
            schema_version: stored.schema_version,
            items: Vec::with_capacity(stored.items.len()),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        };
        for item in stored.items { cart.merge(item); }
        cart
    }
}

/// A line in the guest cart, with enough product data to render it offline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartItem {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: Quantity,
    /// Unit price captured when the line was last added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub compare_price: Option<Decimal>,
    pub product_name: String,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
}

impl GuestCartItem {
    pub fn new(product_id: impl Into<String>, variant_id: Option<String>, quantity: Quantity, price: Decimal) -> Self {
        Self {
            product_id: product_id.into(), variant_id, quantity, price,
            compare_price: None, product_name: String::new(), product_slug: String::new(),
            product_image: None, variant_name: None, store_id: None, store_name: None,
        }
    }

    pub fn key(&self) -> LineKey<'_> { LineKey::new(&self.product_id, self.variant_id.as_deref()) }
    pub fn line_total(&self) -> Decimal { self.price * self.quantity.as_decimal() }
}

impl GuestCart {
    pub fn new() -> Self {
        let now = Utc::now();
        Self { schema_version: CART_SCHEMA_VERSION, items: vec![], created_at: now, updated_at: now }
    }

    pub fn schema_version(&self) -> u32 { self.schema_version }
    pub fn items(&self) -> &[GuestCartItem] { &self.items }
    pub fn into_items(self) -> Vec<GuestCartItem> { self.items }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn item(&self, key: LineKey<'_>) -> Option<&GuestCartItem> { self.items.iter().find(|i| i.key() == key) }

    /// Sum of quantities across lines.
    pub fn item_count(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity.value())).sum() }

    /// Snapshot subtotal; compare prices are ignored here.
    pub fn subtotal(&self) -> Decimal { self.items.iter().map(GuestCartItem::line_total).sum() }

    /// Merges by identity: quantities accumulate, the newest snapshot wins.
    /// Returns the resulting quantity of the line.
    pub fn add_item(&mut self, item: GuestCartItem) -> Quantity {
        let quantity = self.merge(item);
        self.touch();
        quantity
    }

    /// Absolute set; `None` removes the line. Returns false when no line matched.
    pub fn set_quantity(&mut self, key: LineKey<'_>, quantity: Option<Quantity>) -> bool {
        match quantity {
            None => self.remove_item(key),
            Some(q) => {
                let Some(item) = self.items.iter_mut().find(|i| i.key() == key) else { return false };
                item.quantity = q;
                self.touch();
                true
            }
        }
    }

    pub fn remove_item(&mut self, key: LineKey<'_>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.key() != key);
        if self.items.len() == before { return false; }
        self.touch();
        true
    }

    fn merge(&mut self, item: GuestCartItem) -> Quantity {
        match self.items.iter_mut().find(|i| i.key() == item.key()) {
            Some(existing) => {
                let merged = existing.quantity.add(item.quantity);
                *existing = GuestCartItem { quantity: merged, ..item };
                merged
            }
            None => {
                let q = item.quantity;
                self.items.push(item);
                q
            }
        }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Default for GuestCart {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: &str, variant: Option<&str>, qty: u32, price: i64) -> GuestCartItem {
        GuestCartItem::new(product, variant.map(str::to_string), Quantity::new(qty).unwrap(), Decimal::new(price, 0))
    }

    #[test]
    fn test_merge_accumulates_quantity_and_keeps_latest_price() {
        let mut cart = GuestCart::new();
        cart.add_item(item("P1", Some("V1"), 2, 100));
        let merged = cart.add_item(item("P1", Some("V1"), 3, 90));
        assert_eq!(merged.value(), 5);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].price, Decimal::new(90, 0));
    }

    #[test]
    fn test_null_variant_is_its_own_line() {
        let mut cart = GuestCart::new();
        cart.add_item(item("P1", None, 1, 10));
        cart.add_item(item("P1", Some("V1"), 1, 10));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = GuestCart::new();
        cart.add_item(item("P1", None, 2, 25));
        assert!(cart.set_quantity(LineKey::new("P1", None), Quantity::new(7).ok()));
        assert_eq!(cart.subtotal(), Decimal::new(175, 0));
        assert!(!cart.set_quantity(LineKey::new("P2", None), Quantity::new(1).ok()));
        assert!(cart.set_quantity(LineKey::new("P1", None), None));
        assert!(cart.is_empty());
        assert!(!cart.remove_item(LineKey::new("P1", None)));
    }

    #[test]
    fn test_legacy_blob_without_schema_version() {
        let json = r#"{"items":[{"productId":"P1","variantId":null,"quantity":2,"price":45,"productName":"Tea"}],
            "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}"#;
        let cart: GuestCart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.schema_version(), CART_SCHEMA_VERSION);
        assert_eq!(cart.subtotal(), Decimal::new(90, 0));
    }

    #[test]
    fn test_duplicate_stored_lines_merge_on_load() {
        let json = r#"{"schemaVersion":1,"items":[
            {"productId":"P1","variantId":"V1","quantity":2,"price":100,"productName":"Tea"},
            {"productId":"P2","variantId":null,"quantity":1,"price":5,"productName":"Cup"},
            {"productId":"P1","variantId":"V1","quantity":3,"price":90,"productName":"Tea"}],
            "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z"}"#;
        let mut cart: GuestCart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items().len(), 2);
        let line = cart.item(LineKey::new("P1", Some("V1"))).unwrap();
        assert_eq!(line.quantity.value(), 5);
        assert_eq!(line.price, Decimal::new(90, 0));
        assert_eq!(cart.updated_at().to_rfc3339(), "2024-01-02T00:00:00+00:00");

        assert!(cart.set_quantity(LineKey::new("P1", Some("V1")), Quantity::new(1).ok()));
        assert_eq!(cart.item_count(), 2);
        assert!(cart.remove_item(LineKey::new("P1", Some("V1"))));
        assert_eq!(cart.items().len(), 1);
    }
}
