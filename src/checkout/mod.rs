//! Multi-store checkout: grouping, totals and per-store order submission.
pub mod aggregate;
pub mod line;
pub mod submit;

pub use aggregate::{group_by_store, CheckoutSummary, StoreCheckout, StoreGroup, StoreTotals};
pub use line::{CartLine, UNKNOWN_STORE};
pub use submit::{build_requests, CheckoutError, CheckoutMode, OrderSubmitter, StoreFailure};
