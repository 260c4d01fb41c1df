//! Plan administration and the synced-plans listing.

use common::{
    billing::{BillingMode, to_minor_units},
    error::{AppError, Res},
};
use db::{
    dtos::plan::{PlanCreateRequest, PlanUpdateRequest},
    models::plan::Plan,
};
use uuid::Uuid;

use super::billing::BillingService;
use crate::dtos::{
    plan::{PlanCreateBody, PlanUpdateBody},
    product::SyncedPlan,
};

fn required_name(name: &str) -> Res<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

impl BillingService {
    pub async fn create_plan(&self, body: PlanCreateBody) -> Res<Plan> {
        let site_id = body.site_id.trim();
        if site_id.is_empty() {
            return Err(AppError::BadRequest("siteId is required".to_string()));
        }

        let plan = self
            .plans
            .insert(PlanCreateRequest {
                site_id: site_id.to_string(),
                name: required_name(&body.name)?,
                description: body.description,
                price_cents: to_minor_units(body.price_amount)?,
                billing_period: body.billing_period.unwrap_or_default(),
            })
            .await?;
        log::info!("Created plan {} for site {}", plan.id, plan.site_id);
        Ok(plan)
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> Res<Plan> {
        self.plans
            .find_by_id(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))
    }

    /// Partial update. Stripe objects are left alone until the next sync.
    pub async fn update_plan(&self, plan_id: Uuid, body: PlanUpdateBody) -> Res<Plan> {
        let data = PlanUpdateRequest {
            name: body.name.as_deref().map(required_name).transpose()?,
            description: body.description,
            price_cents: body.price_amount.map(to_minor_units).transpose()?,
            billing_period: body.billing_period,
        };

        self.plans
            .update(plan_id, data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))
    }

    /// Plans of a site with a product linked in any mode.
    ///
    /// Reported ids are those of the site's default mode, or the last synced
    /// ones when the plan was never published in that mode. Empty when the
    /// site has no usable billing configuration.
    pub async fn list_synced_plans(&self, site_id: &str) -> Res<Vec<SyncedPlan>> {
        let Some(config) = self
            .sites
            .billing_config(site_id)
            .await?
            .filter(|c| c.is_configured)
        else {
            log::debug!("Site {} has no billing configuration", site_id);
            return Ok(Vec::new());
        };
        let mode = BillingMode::from_test_flag(config.test_mode);

        let plans = self.plans.list_linked_by_site(site_id).await?;
        Ok(plans
            .into_iter()
            .map(|plan| {
                let (product_id, price_id) = match plan.product_id_for(mode) {
                    Some(product_id) => (
                        Some(product_id.to_string()),
                        plan.price_id_for(mode).map(String::from),
                    ),
                    None => (plan.stripe_product_id.clone(), plan.stripe_price_id.clone()),
                };
                SyncedPlan {
                    plan: plan.into(),
                    stripe_product_id: product_id,
                    stripe_price_id: price_id,
                }
            })
            .collect())
    }
}
