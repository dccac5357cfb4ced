//! Storefront cart core
//!
//! Client-side cart logic for a multi-vendor storefront.
//!
//! ## Features
//! - Guest cart persisted in a local key-value slot, with change notifications
//! - One-shot guest-to-account cart sync with bounded backoff
//! - Store-grouped checkout totals with per-store delivery charges
//! - Concurrent per-store order submission

use thiserror::Error;

pub mod api;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod guest_cart;
pub mod notify;
pub mod storage;
pub mod storefront;
pub mod sync;
pub mod telemetry;

pub use api::{ApiError, HttpBackend, OrderService, ServerCart, ServerCartItem, ServerCartView};
pub use checkout::{CartLine, CheckoutError, CheckoutMode, CheckoutSummary, OrderSubmitter, StoreGroup, StoreTotals};
pub use config::{ConfigError, StorefrontConfig};
pub use domain::aggregates::{CheckoutDetails, CustomerDetails, DeliveryAddress, GuestCart, GuestCartItem, PlacedOrder};
pub use domain::events::CartEvent;
pub use domain::value_objects::{DeliveryFees, DeliveryLocation, LineKey, Quantity};
pub use guest_cart::{GuestCartError, GuestCartStore};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use storefront::Storefront;
pub use sync::{CartSync, SessionProbe, SkipReason, SyncOutcome, SyncPolicy};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cart(#[from] GuestCartError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
