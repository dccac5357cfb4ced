//! Per-store order requests
//!
//! Order payloads carry identifiers and quantities only. The backend resolves
//! authoritative prices, so no price field exists on these types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{DeliveryLocation, Quantity};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 300))]
    pub address_line: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub quantity: Quantity,
}

/// Customer and delivery fields shared by every per-store order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Validate)]
pub struct CheckoutDetails {
    #[validate]
    pub customer: CustomerDetails,
    #[validate]
    pub address: DeliveryAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub delivery_location: DeliveryLocation,
    pub address: DeliveryAddress,
    pub store_id: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemRequest>,
    /// Sent as a header rather than in the body.
    #[serde(skip)]
    pub idempotency_key: Uuid,
}

impl CreateOrderRequest {
    pub fn new(store_id: impl Into<String>, delivery_location: DeliveryLocation, details: &CheckoutDetails, items: Vec<OrderItemRequest>) -> Self {
        Self {
            customer: details.customer.clone(),
            delivery_location,
            address: details.address.clone(),
            store_id: store_id.into(),
            payment_method: PaymentMethod::CashOnDelivery,
            items,
            idempotency_key: Uuid::new_v4(),
        }
    }
}

/// What the order service hands back for a created order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub store_id: String,
}
