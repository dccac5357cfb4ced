//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Product, StoreRef, Variant};
pub use order::{CheckoutDetails, CreateOrderRequest, CustomerDetails, DeliveryAddress, OrderItemRequest, PaymentMethod, PlacedOrder};
pub use cart::{GuestCart, GuestCartItem, CART_SCHEMA_VERSION};
