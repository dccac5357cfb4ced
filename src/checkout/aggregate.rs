//! Store grouping and per-store totals.
//!
//! Each store ships and bills on its own, so totals (delivery included) are
//! computed per group. The grand total is for display only.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::line::CartLine;
use crate::domain::value_objects::{DeliveryFees, DeliveryLocation};

#[derive(Debug)]
pub struct StoreGroup<'a, L> {
    pub store_id: &'a str,
    pub store_name: &'a str,
    pub items: Vec<&'a L>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,
}

/// Partitions lines by store in one pass. Store order and the order of lines
/// within a store follow first appearance.
pub fn group_by_store<L: CartLine>(items: &[L]) -> Vec<StoreGroup<'_, L>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<StoreGroup<'_, L>> = Vec::new();
    for item in items {
        let store_id = item.store_id();
        match index.get(store_id) {
            Some(&i) => groups[i].items.push(item),
            None => {
                index.insert(store_id, groups.len());
                groups.push(StoreGroup { store_id, store_name: item.store_name(), items: vec![item] });
            }
        }
    }
    groups
}

impl<L: CartLine> StoreGroup<'_, L> {
    pub fn totals(&self, delivery_charge: Decimal) -> StoreTotals {
        let mut subtotal = Decimal::ZERO;
        let mut total_discount = Decimal::ZERO;
        for item in &self.items {
            let qty = item.quantity().as_decimal();
            subtotal += item.list_unit_price() * qty;
            total_discount += item.unit_discount() * qty;
        }
        StoreTotals { subtotal, total_discount, delivery_charge, total_amount: subtotal - total_discount + delivery_charge }
    }
}

#[derive(Debug)]
pub struct StoreCheckout<'a, L> {
    pub group: StoreGroup<'a, L>,
    pub totals: StoreTotals,
}

#[derive(Debug)]
pub struct CheckoutSummary<'a, L> {
    pub location: DeliveryLocation,
    pub stores: Vec<StoreCheckout<'a, L>>,
    pub grand_total: Decimal,
}

impl<'a, L: CartLine> CheckoutSummary<'a, L> {
    pub fn build(items: &'a [L], location: DeliveryLocation, fees: &DeliveryFees) -> Self {
        let delivery_charge = fees.for_location(location);
        let stores: Vec<StoreCheckout<'a, L>> = group_by_store(items)
            .into_iter()
            .map(|group| {
                let totals = group.totals(delivery_charge);
                StoreCheckout { group, totals }
            })
            .collect();
        let grand_total = stores.iter().map(|s| s.totals.total_amount).sum();
        Self { location, stores, grand_total }
    }

    pub fn is_empty(&self) -> bool { self.stores.is_empty() }
    pub fn total_delivery(&self) -> Decimal { self.stores.iter().map(|s| s.totals.delivery_charge).sum() }
}
