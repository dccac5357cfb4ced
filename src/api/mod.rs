//! Backend collaborators: the authoritative server cart and the order service.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{CreateOrderRequest, GuestCartItem, PlacedOrder, Product};
use crate::domain::value_objects::{LineKey, Quantity};

pub use http::HttpBackend;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not signed in")]
    Unauthenticated,
}

impl ApiError {
    pub fn backend(status: u16, message: impl Into<String>) -> Self { Self::Backend { status, message: message.into() } }

    /// The backend-provided message, if the backend produced one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    pub id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: Quantity,
    pub product: Product,
}

impl ServerCartItem {
    pub fn key(&self) -> LineKey<'_> { LineKey::new(&self.product.id, self.variant_id.as_deref()) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartView {
    pub id: String,
    pub items: Vec<ServerCartItem>,
}

/// One guest line as sent in a sync batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub quantity: Quantity,
}

impl From<&GuestCartItem> for SyncItem {
    fn from(item: &GuestCartItem) -> Self {
        Self { product_id: item.product_id.clone(), variant_id: item.variant_id.clone(), quantity: item.quantity }
    }
}

#[async_trait]
pub trait ServerCart: Send + Sync {
    async fn fetch(&self) -> Result<ServerCartView, ApiError>;
    async fn sync_items(&self, items: &[SyncItem]) -> Result<ServerCartView, ApiError>;
    async fn update_quantity(&self, item_id: &str, quantity: Quantity) -> Result<ServerCartView, ApiError>;
    async fn remove_item(&self, item_id: &str) -> Result<ServerCartView, ApiError>;
    async fn clear(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, ApiError>;
    async fn create_guest_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, ApiError>;
}
