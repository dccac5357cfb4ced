//! Wiring of the cart components from one configuration.

use std::sync::Arc;

use crate::api::HttpBackend;
use crate::checkout::{CartLine, CheckoutSummary, OrderSubmitter};
use crate::config::StorefrontConfig;
use crate::domain::value_objects::DeliveryLocation;
use crate::guest_cart::GuestCartStore;
use crate::notify::{Notifier, TracingNotifier};
use crate::sync::CartSync;
use crate::Result;

pub struct Storefront {
    config: StorefrontConfig,
    guest: Arc<GuestCartStore>,
    backend: Arc<HttpBackend>,
    sync: CartSync,
    orders: OrderSubmitter,
}

impl Storefront {
    pub fn new(config: StorefrontConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let guest = Arc::new(GuestCartStore::new(config.open_storage()?, config.cart_key.clone()));
        let backend = Arc::new(HttpBackend::new(config.api_url.clone()));
        let sync = CartSync::new(guest.clone(), backend.clone(), notifier.clone(), config.sync.clone());
        let orders = OrderSubmitter::new(backend.clone(), notifier).with_guest_cart(guest.clone());
        tracing::info!(api_url = %config.api_url, cart_key = %config.cart_key, "storefront cart ready");
        Ok(Self { config, guest, backend, sync, orders })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(StorefrontConfig::from_env()?, Arc::new(TracingNotifier))
    }

    pub fn config(&self) -> &StorefrontConfig { &self.config }
    pub fn guest_cart(&self) -> &Arc<GuestCartStore> { &self.guest }
    pub fn backend(&self) -> &HttpBackend { &self.backend }
    pub fn cart_sync(&self) -> &CartSync { &self.sync }
    pub fn orders(&self) -> &OrderSubmitter { &self.orders }

    /// Totals for whichever cart is active, with the configured delivery fees.
    pub fn summarize<'a, L: CartLine>(&self, items: &'a [L], location: DeliveryLocation) -> CheckoutSummary<'a, L> {
        CheckoutSummary::build(items, location, &self.config.delivery_fees)
    }
}
