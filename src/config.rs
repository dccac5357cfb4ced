//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::value_objects::DeliveryFees;
use crate::guest_cart::DEFAULT_CART_KEY;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
use crate::sync::{SyncPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_RETRY_MARKER};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorefrontConfig {
    pub api_url: String,
    pub cart_key: String,
    /// Directory for file-backed storage; `None` keeps the cart in memory.
    pub storage_dir: Option<PathBuf>,
    pub delivery_fees: DeliveryFees,
    pub sync: SyncPolicy,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/v1".to_string(),
            cart_key: DEFAULT_CART_KEY.to_string(),
            storage_dir: None,
            delivery_fees: DeliveryFees::default(),
            sync: SyncPolicy::default(),
        }
    }
}

impl StorefrontConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let fees = defaults.delivery_fees;
        Ok(Self {
            api_url: lookup("STOREFRONT_API_URL").unwrap_or(defaults.api_url),
            cart_key: lookup("STOREFRONT_CART_KEY").unwrap_or(defaults.cart_key),
            storage_dir: lookup("STOREFRONT_STORAGE_DIR").map(PathBuf::from),
            delivery_fees: DeliveryFees {
                inside_city: parse(&lookup, "DELIVERY_FEE_INSIDE_CITY", fees.inside_city)?,
                outside_city: parse(&lookup, "DELIVERY_FEE_OUTSIDE_CITY", fees.outside_city)?,
            },
            sync: SyncPolicy {
                max_retries: parse(&lookup, "CART_SYNC_MAX_RETRIES", defaults.sync.max_retries)?,
                base_delay: Duration::from_millis(parse(&lookup, "CART_SYNC_BASE_DELAY_MS", DEFAULT_BASE_DELAY_MS)?),
                retry_marker: lookup("CART_SYNC_RETRY_MARKER").unwrap_or_else(|| DEFAULT_RETRY_MARKER.to_string()),
            },
        })
    }

    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>, StorageError> {
        match &self.storage_dir {
            Some(dir) => Ok(Arc::new(FileStorage::new(dir)?)),
            None => Ok(Arc::new(MemoryStorage::new())),
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StorefrontConfig::default());
        assert_eq!(config.cart_key, "guest_cart");
        assert_eq!(config.delivery_fees.inside_city, Decimal::new(70, 0));
        assert_eq!(config.sync.base_delay, Duration::from_millis(DEFAULT_BASE_DELAY_MS));
        assert_eq!(config.sync, SyncPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("STOREFRONT_API_URL", "https://api.example.com"),
            ("STOREFRONT_STORAGE_DIR", "/tmp/cart"),
            ("DELIVERY_FEE_OUTSIDE_CITY", "149.50"),
            ("CART_SYNC_MAX_RETRIES", "5"),
            ("CART_SYNC_BASE_DELAY_MS", "250"),
            ("CART_SYNC_RETRY_MARKER", "customer pending"),
        ])).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/cart")));
        assert_eq!(config.delivery_fees.outside_city, Decimal::new(14950, 2));
        assert_eq!(config.sync.max_retries, 5);
        assert_eq!(config.sync.base_delay, Duration::from_millis(250));
        assert_eq!(config.sync.retry_marker, "customer pending");
    }

    #[test]
    fn test_open_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig { storage_dir: Some(dir.path().join("cart")), ..Default::default() };
        let storage = config.open_storage().unwrap();
        storage.set_item("guest_cart", "[]").unwrap();
        assert!(dir.path().join("cart").join("guest_cart.json").exists());
    }

    #[test]
    fn test_malformed_number() {
        let err = StorefrontConfig::from_lookup(lookup(&[("CART_SYNC_BASE_DELAY_MS", "soon")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "CART_SYNC_BASE_DELAY_MS", value: "soon".into() });
    }
}
