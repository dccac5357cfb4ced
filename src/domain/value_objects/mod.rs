//! Value Objects for the storefront cart

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Line quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }

    /// Interprets a requested absolute quantity. `Ok(None)` means the line should go.
    pub fn from_requested(value: i64) -> Result<Option<Self>, QuantityError> {
        if value <= 0 { return Ok(None); }
        let value = u32::try_from(value).map_err(|_| QuantityError::TooLarge(value))?;
        Ok(Some(Self(value)))
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
    pub fn as_decimal(&self) -> Decimal { Decimal::from(self.0) }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// Identity of a cart line. A missing variant never equals a concrete one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineKey<'a> {
    pub product_id: &'a str,
    pub variant_id: Option<&'a str>,
}

impl<'a> LineKey<'a> {
    pub fn new(product_id: &'a str, variant_id: Option<&'a str>) -> Self { Self { product_id, variant_id } }
}

impl fmt::Display for LineKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant_id {
            Some(v) => write!(f, "{}:{}", self.product_id, v),
            None => write!(f, "{}", self.product_id),
        }
    }
}

/// Where an order ships, relative to the reference metro area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryLocation {
    #[default]
    InsideCity,
    OutsideCity,
}

/// Flat per-store delivery fee tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryFees {
    pub inside_city: Decimal,
    pub outside_city: Decimal,
}

impl DeliveryFees {
    pub fn for_location(&self, location: DeliveryLocation) -> Decimal {
        match location {
            DeliveryLocation::InsideCity => self.inside_city,
            DeliveryLocation::OutsideCity => self.outside_city,
        }
    }
}

impl Default for DeliveryFees {
    fn default() -> Self { Self { inside_city: Decimal::new(70, 0), outside_city: Decimal::new(130, 0) } }
}

/// Unit list price: the compare price when it is strictly above the current price.
pub fn list_price(current: Decimal, compare: Option<Decimal>) -> Decimal {
    match compare {
        Some(c) if c > current => c,
        _ => current,
    }
}
