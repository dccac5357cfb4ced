//! Guest cart store
//!
//! Every operation re-reads the persisted slot, applies the change to a
//! [`GuestCart`] and writes it back. Nothing is cached between calls.
//!
//! Writers in other processes sharing the same slot are not coordinated with:
//! the last write to land wins.

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::aggregates::{GuestCart, GuestCartItem};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{LineKey, Quantity, QuantityError};
use crate::storage::{KeyValueStorage, StorageError};

pub const DEFAULT_CART_KEY: &str = "guest_cart";

const EVENT_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum GuestCartError {
    #[error("Price cannot be negative")]
    NegativePrice,

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct GuestCartStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    events: broadcast::Sender<CartEvent>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for GuestCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestCartStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl GuestCartStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { storage, key: key.into(), events, write_lock: Mutex::new(()) }
    }

    pub fn key(&self) -> &str { &self.key }

    /// Receives a [`CartEvent`] after each successful mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> { self.events.subscribe() }

    /// Reads the persisted cart. Unreadable or malformed content reads as no cart.
    pub fn get(&self) -> Option<GuestCart> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "guest cart storage unavailable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(cart) => Some(cart),
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unparseable guest cart");
                None
            }
        }
    }

    pub fn add(&self, item: GuestCartItem) -> Result<(), GuestCartError> {
        if item.price < Decimal::ZERO { return Err(GuestCartError::NegativePrice); }
        let _guard = self.lock();
        let mut cart = self.get().unwrap_or_default();
        let product_id = item.product_id.clone();
        let variant_id = item.variant_id.clone();
        let quantity = cart.add_item(item);
        self.save(&cart)?;
        debug!(product_id = %product_id, variant_id = ?variant_id, quantity = quantity.value(), "guest cart line added");
        self.publish(CartEvent::ItemAdded { product_id, variant_id, quantity: quantity.value() });
        Ok(())
    }

    /// Sets an absolute quantity. Zero or less removes the line; unknown lines are ignored.
    pub fn update_quantity(&self, product_id: &str, variant_id: Option<&str>, quantity: i64) -> Result<(), GuestCartError> {
        let requested = Quantity::from_requested(quantity)?;
        let _guard = self.lock();
        let Some(mut cart) = self.get() else { return Ok(()) };
        let key = LineKey::new(product_id, variant_id);
        if !cart.set_quantity(key, requested) { return Ok(()); }
        self.save(&cart)?;
        let event = match requested {
            Some(q) => CartEvent::QuantityUpdated { product_id: product_id.into(), variant_id: variant_id.map(Into::into), quantity: q.value() },
            None => CartEvent::ItemRemoved { product_id: product_id.into(), variant_id: variant_id.map(Into::into) },
        };
        self.publish(event);
        Ok(())
    }

    pub fn remove(&self, product_id: &str, variant_id: Option<&str>) -> Result<(), GuestCartError> {
        let _guard = self.lock();
        let Some(mut cart) = self.get() else { return Ok(()) };
        if !cart.remove_item(LineKey::new(product_id, variant_id)) { return Ok(()); }
        self.save(&cart)?;
        self.publish(CartEvent::ItemRemoved { product_id: product_id.into(), variant_id: variant_id.map(Into::into) });
        Ok(())
    }

    pub fn clear(&self) -> Result<(), GuestCartError> {
        let _guard = self.lock();
        self.storage.remove_item(&self.key)?;
        self.publish(CartEvent::Cleared);
        Ok(())
    }

    pub fn item_count(&self) -> u64 { self.get().map_or(0, |c| c.item_count()) }
    pub fn subtotal(&self) -> Decimal { self.get().map_or(Decimal::ZERO, |c| c.subtotal()) }
    pub fn items(&self) -> Vec<GuestCartItem> { self.get().map(GuestCart::into_items).unwrap_or_default() }

    pub fn get_item(&self, product_id: &str, variant_id: Option<&str>) -> Option<GuestCartItem> {
        self.get()?.item(LineKey::new(product_id, variant_id)).cloned()
    }

    pub fn has_item(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.get_item(product_id, variant_id).is_some()
    }

    fn save(&self, cart: &GuestCart) -> Result<(), GuestCartError> {
        let raw = serde_json::to_string(cart)?;
        self.storage.set_item(&self.key, &raw)?;
        Ok(())
    }

    fn publish(&self, event: CartEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
