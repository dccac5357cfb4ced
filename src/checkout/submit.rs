//! Per-store order submission.

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use super::aggregate::CheckoutSummary;
use super::line::CartLine;
use crate::api::{ApiError, OrderService};
use crate::domain::aggregates::{CheckoutDetails, CreateOrderRequest, OrderItemRequest, PlacedOrder};
use crate::guest_cart::GuestCartStore;
use crate::notify::{Notice, Notifier};

const ORDER_FAILED_MESSAGE: &str = "Failed to place order. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutMode {
    Authenticated,
    Guest,
}

#[derive(Debug)]
pub struct StoreFailure {
    pub store_id: String,
    pub error: ApiError,
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid checkout details: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Orders in `placed` already exist on the backend.
    #[error("{} of {} store orders failed", .failed.len(), .failed.len() + .placed.len())]
    Incomplete { placed: Vec<PlacedOrder>, failed: Vec<StoreFailure> },
}

/// One request per store group. Only identifiers and quantities are sent.
pub fn build_requests<L: CartLine>(summary: &CheckoutSummary<'_, L>, details: &CheckoutDetails) -> Vec<CreateOrderRequest> {
    summary.stores.iter().map(|store| {
        let items = store.group.items.iter().map(|line| {
            let key = line.key();
            OrderItemRequest { product_id: key.product_id.to_string(), variant_id: key.variant_id.map(str::to_string), quantity: line.quantity() }
        }).collect();
        CreateOrderRequest::new(store.group.store_id, summary.location, details, items)
    }).collect()
}

pub struct OrderSubmitter {
    orders: Arc<dyn OrderService>,
    notifier: Arc<dyn Notifier>,
    guest: Option<Arc<GuestCartStore>>,
}

impl OrderSubmitter {
    pub fn new(orders: Arc<dyn OrderService>, notifier: Arc<dyn Notifier>) -> Self {
        Self { orders, notifier, guest: None }
    }

    /// Guest cart to empty once a guest checkout fully succeeds.
    pub fn with_guest_cart(mut self, guest: Arc<GuestCartStore>) -> Self {
        self.guest = Some(guest);
        self
    }

    /// Submits every store's order concurrently and waits for all of them.
    #[instrument(skip_all, fields(stores = summary.stores.len(), mode = ?mode))]
    pub async fn submit<L: CartLine>(&self, summary: &CheckoutSummary<'_, L>, details: &CheckoutDetails, mode: CheckoutMode) -> Result<Vec<PlacedOrder>, CheckoutError> {
        if summary.is_empty() { return Err(CheckoutError::EmptyCart); }
        if let Err(e) = details.validate() {
            self.notifier.notify(Notice::error("Please check your delivery details."));
            return Err(e.into());
        }

        let requests = build_requests(summary, details);
        let results = join_all(requests.iter().map(|req| async move {
            match mode {
                CheckoutMode::Authenticated => self.orders.create_order(req).await,
                CheckoutMode::Guest => self.orders.create_guest_order(req).await,
            }
        })).await;

        let mut placed = Vec::new();
        let mut failed = Vec::new();
        for (req, result) in requests.iter().zip(results) {
            match result {
                Ok(mut order) => {
                    if order.store_id.is_empty() { order.store_id = req.store_id.clone(); }
                    placed.push(order);
                }
                Err(error) => {
                    error!(store_id = %req.store_id, error = %error, "store order failed");
                    failed.push(StoreFailure { store_id: req.store_id.clone(), error });
                }
            }
        }

        if !failed.is_empty() {
            let message = failed.iter().find_map(|f| f.error.backend_message()).unwrap_or(ORDER_FAILED_MESSAGE);
            self.notifier.notify(Notice::error(message));
            return Err(CheckoutError::Incomplete { placed, failed });
        }

        info!(orders = placed.len(), "checkout complete");
        if mode == CheckoutMode::Guest {
            if let Some(guest) = &self.guest {
                if let Err(e) = guest.clear() { warn!(error = %e, "failed to clear guest cart after checkout"); }
            }
        }
        self.notifier.notify(Notice::success("Order placed successfully"));
        Ok(placed)
    }
}
