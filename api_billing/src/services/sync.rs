//! Product/price reconciliation between a plan and Stripe.

use std::collections::HashMap;

use common::{
    billing::{BillingMode, SecretKey},
    error::{AppError, Res},
};
use db::{dtos::plan::StripeLinkUpdate, models::plan::Plan};

use super::{
    billing::{BillingService, CreateOutcome, SyncCommand, UpdateOutcome},
    credentials::resolve_key,
    gateway::{PriceParams, ProductParams, RemotePrice},
};

const PLAN_TYPE: &str = "subscription_plan";

fn metadata(plan: &Plan) -> HashMap<String, String> {
    HashMap::from([
        ("siteId".to_string(), plan.site_id.clone()),
        ("planId".to_string(), plan.id.to_string()),
        ("type".to_string(), PLAN_TYPE.to_string()),
    ])
}

fn product_params(plan: &Plan) -> ProductParams {
    let description = plan
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("Abonnement {}", plan.name));
    ProductParams {
        name: plan.name.clone(),
        description,
        metadata: metadata(plan),
    }
}

fn price_params(plan: &Plan, product_id: &str) -> PriceParams {
    PriceParams {
        product_id: product_id.to_string(),
        unit_amount: plan.price_cents,
        interval: plan.period().interval(),
        metadata: metadata(plan),
    }
}

struct PriceRefresh {
    price_id: String,
    price: Option<RemotePrice>,
    succeeded: bool,
    /// `price_id` was created by this sync.
    created: bool,
    /// Previous price, archived only once `price_id` is recorded on the plan.
    superseded: Option<String>,
}

impl PriceRefresh {
    fn kept(price_id: String, price: Option<RemotePrice>, succeeded: bool) -> Self {
        PriceRefresh {
            price_id,
            price,
            succeeded,
            created: false,
            superseded: None,
        }
    }
}

impl BillingService {
    /// Publishes a plan: creates its product and price in the resolved mode.
    ///
    /// A plan already linked in that mode is routed to the update flow so
    /// repeated publishes never duplicate remote objects.
    pub async fn create_product_and_price(&self, cmd: SyncCommand) -> Res<CreateOutcome> {
        let (mode, key) = self.resolve_credentials(&cmd).await?;
        let _guard = self.locks.acquire(cmd.plan_id, mode).await;
        let plan = self.load_plan(&cmd).await?;

        if let Some(product_id) = plan.product_id_for(mode).map(String::from) {
            log::info!(
                "Plan {} already linked to {} in {} mode, updating instead",
                plan.id,
                product_id,
                mode
            );
            let outcome = self.sync_linked(plan, mode, &key, product_id).await?;
            return Ok(outcome.into());
        }

        let product = self
            .gateway
            .create_product(&key, &product_params(&plan))
            .await?;
        log::info!("Created {} product {} for plan {}", mode, product.id, plan.id);

        let price = match self
            .gateway
            .create_price(&key, &price_params(&plan, &product.id))
            .await
        {
            Ok(price) => price,
            Err(err) => {
                self.discard_product(&key, &product.id).await;
                return Err(err);
            }
        };
        log::info!(
            "Created {} price {} ({} cents) for plan {}",
            mode,
            price.id,
            plan.price_cents,
            plan.id
        );

        let plan = match self.record_links(&plan, mode, &product.id, &price.id).await {
            Ok(plan) => plan,
            Err(err) => {
                self.discard_price(&key, &price.id).await;
                self.discard_product(&key, &product.id).await;
                return Err(err);
            }
        };

        Ok(CreateOutcome {
            plan,
            product,
            price: Some(price),
        })
    }

    /// Re-syncs an already published plan in the resolved mode.
    pub async fn update_product_and_price(&self, cmd: SyncCommand) -> Res<UpdateOutcome> {
        let (mode, key) = self.resolve_credentials(&cmd).await?;
        let _guard = self.locks.acquire(cmd.plan_id, mode).await;
        let plan = self.load_plan(&cmd).await?;

        let product_id = plan.product_id_for(mode).map(String::from).ok_or_else(|| {
            AppError::NotFound(format!(
                "Plan {} has no Stripe product in {} mode, create it first",
                plan.id, mode
            ))
        })?;

        self.sync_linked(plan, mode, &key, product_id).await
    }

    /// Validation and configuration checks, all before any gateway call.
    async fn resolve_credentials(&self, cmd: &SyncCommand) -> Res<(BillingMode, SecretKey)> {
        let config = self
            .sites
            .billing_config(&cmd.site_id)
            .await?
            .filter(|c| c.is_configured)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "Stripe is not configured for site {}",
                    cmd.site_id
                ))
            })?;

        let mode = cmd
            .mode
            .unwrap_or_else(|| BillingMode::from_test_flag(config.test_mode));
        let key = resolve_key(self.verifier.as_ref(), &config, mode, &cmd.credentials).await?;
        Ok((mode, key))
    }

    async fn load_plan(&self, cmd: &SyncCommand) -> Res<Plan> {
        self.plans
            .find_by_id(cmd.plan_id)
            .await?
            .filter(|plan| plan.site_id == cmd.site_id)
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", cmd.plan_id)))
    }

    async fn sync_linked(
        &self,
        plan: Plan,
        mode: BillingMode,
        key: &SecretKey,
        product_id: String,
    ) -> Res<UpdateOutcome> {
        let product = self
            .gateway
            .update_product(key, &product_id, &product_params(&plan))
            .await?;
        log::info!("Updated {} product {} for plan {}", mode, product.id, plan.id);

        let refresh = match plan.price_id_for(mode).map(String::from) {
            Some(current) => self.refresh_price(&plan, key, &product_id, current).await,
            None => {
                let price = self
                    .gateway
                    .create_price(key, &price_params(&plan, &product_id))
                    .await?;
                log::info!("Created missing {} price {} for plan {}", mode, price.id, plan.id);
                PriceRefresh {
                    price_id: price.id.clone(),
                    price: Some(price),
                    succeeded: true,
                    created: true,
                    superseded: None,
                }
            }
        };

        let plan = match self
            .record_links(&plan, mode, &product_id, &refresh.price_id)
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                if refresh.created {
                    self.discard_price(key, &refresh.price_id).await;
                }
                return Err(err);
            }
        };

        let mut succeeded = refresh.succeeded;
        if let Some(old_id) = &refresh.superseded {
            succeeded &= self.archive_superseded(key, old_id, &refresh.price_id).await;
        }

        Ok(UpdateOutcome {
            plan,
            product,
            price_id: refresh.price_id,
            price: refresh.price,
            price_refresh_succeeded: succeeded,
        })
    }

    /// Best-effort price refresh.
    ///
    /// Prices are immutable: a changed amount or interval means a new price.
    /// The old one is only handed back as `superseded`; archiving it waits for
    /// the new pointer to be recorded. Failures here are logged and reported
    /// through `succeeded`, never returned.
    async fn refresh_price(
        &self,
        plan: &Plan,
        key: &SecretKey,
        product_id: &str,
        current_id: String,
    ) -> PriceRefresh {
        let current = match self.gateway.retrieve_price(key, &current_id).await {
            Ok(price) => price,
            Err(err) => {
                log::warn!(
                    "Could not retrieve price {} of plan {}, keeping it: {}",
                    current_id,
                    plan.id,
                    err
                );
                return PriceRefresh::kept(current_id, None, false);
            }
        };

        let interval = plan.period().interval();
        if current.matches(plan.price_cents, interval) {
            return PriceRefresh::kept(current_id, Some(current), true);
        }

        let fresh = match self
            .gateway
            .create_price(key, &price_params(plan, product_id))
            .await
        {
            Ok(price) => price,
            Err(err) => {
                log::error!(
                    "Could not create replacement price for plan {}, keeping {}: {}",
                    plan.id,
                    current_id,
                    err
                );
                return PriceRefresh::kept(current_id, Some(current), false);
            }
        };
        log::info!(
            "Replaced price {} with {} for plan {} ({:?} -> {} cents)",
            current_id,
            fresh.id,
            plan.id,
            current.unit_amount,
            plan.price_cents
        );

        PriceRefresh {
            price_id: fresh.id.clone(),
            price: Some(fresh),
            succeeded: true,
            created: true,
            superseded: Some(current_id),
        }
    }

    /// Archives the price a recorded replacement took over from.
    async fn archive_superseded(&self, key: &SecretKey, old_id: &str, new_id: &str) -> bool {
        match self.gateway.archive_price(key, old_id).await {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "Price {} replaced by {} but could not be archived: {}",
                    old_id,
                    new_id,
                    err
                );
                false
            }
        }
    }

    /// Archives a price that never made it onto the plan.
    async fn discard_price(&self, key: &SecretKey, price_id: &str) {
        match self.gateway.archive_price(key, price_id).await {
            Ok(()) => log::warn!("Archived unrecorded price {}", price_id),
            Err(err) => log::error!(
                "Price {} is unrecorded and could not be archived: {}",
                price_id,
                err
            ),
        }
    }

    /// Archives a product that never made it onto the plan.
    async fn discard_product(&self, key: &SecretKey, product_id: &str) {
        match self.gateway.archive_product(key, product_id).await {
            Ok(()) => log::warn!("Archived orphaned product {}", product_id),
            Err(err) => log::error!(
                "Product {} is orphaned and could not be archived: {}",
                product_id,
                err
            ),
        }
    }

    async fn record_links(
        &self,
        plan: &Plan,
        mode: BillingMode,
        product_id: &str,
        price_id: &str,
    ) -> Res<Plan> {
        self.plans
            .record_stripe_links(StripeLinkUpdate {
                plan_id: plan.id,
                mode,
                product_id: product_id.to_string(),
                price_id: price_id.to_string(),
                expected_version: plan.version,
            })
            .await
            .inspect_err(|err| {
                log::error!(
                    "Stripe ids {}/{} could not be recorded on plan {}: {}",
                    product_id,
                    price_id,
                    plan.id,
                    err
                )
            })
    }
}
