//! Remote billing gateway port.
//!
//! Every call carries the secret key to use, so test and live accounts can be
//! driven side by side. Prices are immutable remotely: the only mutation
//! offered is archiving (`active = false`); nothing is ever deleted.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{
    billing::{RecurringInterval, SecretKey},
    error::Res,
};
use serde::Serialize;

pub const CURRENCY: &str = "eur";

#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_product(&self, key: &SecretKey, params: &ProductParams) -> Res<RemoteProduct>;

    /// Pushes name, description and metadata to an existing product.
    async fn update_product(
        &self,
        key: &SecretKey,
        product_id: &str,
        params: &ProductParams,
    ) -> Res<RemoteProduct>;

    async fn archive_product(&self, key: &SecretKey, product_id: &str) -> Res<()>;

    async fn create_price(&self, key: &SecretKey, params: &PriceParams) -> Res<RemotePrice>;

    async fn retrieve_price(&self, key: &SecretKey, price_id: &str) -> Res<RemotePrice>;

    async fn archive_price(&self, key: &SecretKey, price_id: &str) -> Res<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductParams {
    pub name: String,
    pub description: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceParams {
    pub product_id: String,
    /// Minor units (cents).
    pub unit_amount: i64,
    pub interval: RecurringInterval,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProduct {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePrice {
    pub id: String,
    pub product_id: Option<String>,
    pub unit_amount: Option<i64>,
    pub currency: Option<String>,
    pub interval: Option<RecurringInterval>,
    pub active: bool,
}

impl RemotePrice {
    /// Whether this price still bills `unit_amount` every `interval`.
    pub fn matches(&self, unit_amount: i64, interval: RecurringInterval) -> bool {
        let amount_changed = self.unit_amount != Some(unit_amount);
        let interval_changed = self.interval != Some(interval);
        !amount_changed && !interval_changed
    }
}
