use std::{future::Future, time::Duration};

use async_trait::async_trait;
use common::{
    billing::{IntervalUnit, RecurringInterval, SecretKey},
    error::{AppError, Res},
    stripe::create_client,
};
use stripe::{
    CreatePrice, CreatePriceRecurring, CreatePriceRecurringInterval, CreateProduct, Currency,
    IdOrCreate, Price, PriceId, Product, ProductId, StripeError, UpdatePrice, UpdateProduct,
};

use super::gateway::{BillingGateway, PriceParams, ProductParams, RemotePrice, RemoteProduct};

/// `BillingGateway` backed by the Stripe API.
pub struct StripeGateway {
    timeout: Duration,
}

impl StripeGateway {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn timed<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, StripeError>>,
    ) -> Res<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::GatewayTimeout(format!(
                "{} exceeded {}s",
                operation,
                self.timeout.as_secs()
            ))),
        }
    }
}

fn parse_product_id(product_id: &str) -> Res<ProductId> {
    product_id.parse::<ProductId>().map_err(|e| {
        AppError::Internal(format!(
            "Failed to parse product id: {}. {}",
            product_id, e
        ))
    })
}

fn parse_price_id(price_id: &str) -> Res<PriceId> {
    price_id
        .parse::<PriceId>()
        .map_err(|e| AppError::Internal(format!("Failed to parse price id: {}. {}", price_id, e)))
}

fn to_stripe_interval(unit: IntervalUnit) -> CreatePriceRecurringInterval {
    match unit {
        IntervalUnit::Day => CreatePriceRecurringInterval::Day,
        IntervalUnit::Week => CreatePriceRecurringInterval::Week,
        IntervalUnit::Month => CreatePriceRecurringInterval::Month,
        IntervalUnit::Year => CreatePriceRecurringInterval::Year,
    }
}

impl From<Product> for RemoteProduct {
    fn from(product: Product) -> Self {
        RemoteProduct {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            active: product.active.unwrap_or(false),
            metadata: product.metadata.unwrap_or_default(),
        }
    }
}

impl From<Price> for RemotePrice {
    fn from(price: Price) -> Self {
        let interval = price.recurring.as_ref().and_then(|recurring| {
            IntervalUnit::parse(&recurring.interval.to_string()).map(|unit| RecurringInterval {
                unit,
                count: recurring.interval_count,
            })
        });
        RemotePrice {
            id: price.id.to_string(),
            product_id: price.product.as_ref().map(|p| p.id().to_string()),
            unit_amount: price.unit_amount,
            currency: price.currency.map(|c| c.to_string()),
            interval,
            active: price.active.unwrap_or(false),
        }
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    async fn create_product(&self, key: &SecretKey, params: &ProductParams) -> Res<RemoteProduct> {
        let client = create_client(key);
        let mut create = CreateProduct::new(params.name.as_str());
        create.description = Some(params.description.as_str());
        create.metadata = Some(params.metadata.clone());

        let product = self
            .timed("products.create", Product::create(&client, create))
            .await?;
        Ok(product.into())
    }

    async fn update_product(
        &self,
        key: &SecretKey,
        product_id: &str,
        params: &ProductParams,
    ) -> Res<RemoteProduct> {
        let client = create_client(key);
        let id = parse_product_id(product_id)?;
        let mut update = UpdateProduct::new();
        update.name = Some(params.name.as_str());
        update.description = Some(params.description.clone());
        update.metadata = Some(params.metadata.clone());

        let product = self
            .timed("products.update", Product::update(&client, &id, update))
            .await?;
        Ok(product.into())
    }

    async fn archive_product(&self, key: &SecretKey, product_id: &str) -> Res<()> {
        let client = create_client(key);
        let id = parse_product_id(product_id)?;
        let mut update = UpdateProduct::new();
        update.active = Some(false);

        self.timed("products.update", Product::update(&client, &id, update))
            .await?;
        Ok(())
    }

    async fn create_price(&self, key: &SecretKey, params: &PriceParams) -> Res<RemotePrice> {
        let client = create_client(key);
        let mut create = CreatePrice::new(Currency::EUR);
        create.product = Some(IdOrCreate::Id(params.product_id.as_str()));
        create.unit_amount = Some(params.unit_amount);
        create.recurring = Some(CreatePriceRecurring {
            aggregate_usage: None,
            interval: to_stripe_interval(params.interval.unit),
            interval_count: Some(params.interval.count),
            trial_period_days: None,
            usage_type: None,
        });
        create.metadata = Some(params.metadata.clone());

        let price = self
            .timed("prices.create", Price::create(&client, create))
            .await?;
        Ok(price.into())
    }

    async fn retrieve_price(&self, key: &SecretKey, price_id: &str) -> Res<RemotePrice> {
        let client = create_client(key);
        let id = parse_price_id(price_id)?;

        let price = self
            .timed("prices.retrieve", Price::retrieve(&client, &id, &[]))
            .await?;
        Ok(price.into())
    }

    async fn archive_price(&self, key: &SecretKey, price_id: &str) -> Res<()> {
        let client = create_client(key);
        let id = parse_price_id(price_id)?;
        let mut update = UpdatePrice::new();
        update.active = Some(false);

        self.timed("prices.update", Price::update(&client, &id, update))
            .await?;
        Ok(())
    }
}
