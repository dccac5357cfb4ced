//! Cart, product and order domain types
pub mod aggregates;
pub mod events;
pub mod value_objects;
