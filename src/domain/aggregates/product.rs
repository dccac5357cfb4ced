//! Product snapshot carried by server cart lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub compare_price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub compare_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    pub store: StoreRef,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    pub fn variant(&self, variant_id: Option<&str>) -> Option<&Variant> {
        let id = variant_id?;
        self.variants.iter().find(|v| v.id == id)
    }

    /// Variant price when the selected variant defines one, else the base price.
    pub fn unit_price(&self, variant_id: Option<&str>) -> Decimal {
        self.variant(variant_id).and_then(|v| v.price).unwrap_or(self.price)
    }

    /// Variant compare price when defined, else the product's.
    pub fn compare_price(&self, variant_id: Option<&str>) -> Option<Decimal> {
        self.variant(variant_id).and_then(|v| v.compare_price).or(self.compare_price)
    }
}
