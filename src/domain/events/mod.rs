//! Domain events
use serde::Serialize;

/// Published by the guest cart store after every successful mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded { product_id: String, variant_id: Option<String>, quantity: u32 },
    QuantityUpdated { product_id: String, variant_id: Option<String>, quantity: u32 },
    ItemRemoved { product_id: String, variant_id: Option<String> },
    Cleared,
}
