//! Common view over guest and server cart lines.

use rust_decimal::Decimal;

use crate::api::ServerCartItem;
use crate::domain::aggregates::GuestCartItem;
use crate::domain::value_objects::{list_price, LineKey, Quantity};

/// Store key used for guest lines that carry no store.
pub const UNKNOWN_STORE: &str = "unknown";

pub trait CartLine {
    fn key(&self) -> LineKey<'_>;
    fn quantity(&self) -> Quantity;
    fn store_id(&self) -> &str;
    fn store_name(&self) -> &str;
    fn current_unit_price(&self) -> Decimal;
    fn compare_unit_price(&self) -> Option<Decimal>;

    /// Compare price when it is above the current price, else the current price.
    fn list_unit_price(&self) -> Decimal { list_price(self.current_unit_price(), self.compare_unit_price()) }

    /// Per-unit discount; never negative.
    fn unit_discount(&self) -> Decimal { (self.list_unit_price() - self.current_unit_price()).max(Decimal::ZERO) }
}

impl CartLine for GuestCartItem {
    fn key(&self) -> LineKey<'_> { GuestCartItem::key(self) }
    fn quantity(&self) -> Quantity { self.quantity }
    fn store_id(&self) -> &str { self.store_id.as_deref().unwrap_or(UNKNOWN_STORE) }
    fn store_name(&self) -> &str { self.store_name.as_deref().unwrap_or_default() }
    fn current_unit_price(&self) -> Decimal { self.price }
    fn compare_unit_price(&self) -> Option<Decimal> { self.compare_price }
}

impl CartLine for ServerCartItem {
    fn key(&self) -> LineKey<'_> { ServerCartItem::key(self) }
    fn quantity(&self) -> Quantity { self.quantity }
    fn store_id(&self) -> &str { &self.product.store.id }
    fn store_name(&self) -> &str { &self.product.store.name }
    fn current_unit_price(&self) -> Decimal { self.product.unit_price(self.variant_id.as_deref()) }
    fn compare_unit_price(&self) -> Option<Decimal> { self.product.compare_price(self.variant_id.as_deref()) }
}
