use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use db::{
    dtos::plan::{PlanCreateRequest, PlanUpdateRequest, StripeLinkUpdate},
    models::{plan::Plan, site::SiteBillingConfig},
};
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence of subscription plans.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn find_by_id(&self, plan_id: Uuid) -> Res<Option<Plan>>;

    async fn list_linked_by_site(&self, site_id: &str) -> Res<Vec<Plan>>;

    async fn insert(&self, data: PlanCreateRequest) -> Res<Plan>;

    /// Partial merge; unspecified fields are left untouched.
    async fn update(&self, plan_id: Uuid, data: PlanUpdateRequest) -> Res<Option<Plan>>;

    /// Fails with `AppError::Conflict` when the plan moved past `expected_version`.
    async fn record_stripe_links(&self, data: StripeLinkUpdate) -> Res<Plan>;
}

#[async_trait]
pub trait SiteConfigStore: Send + Sync {
    async fn billing_config(&self, site_id: &str) -> Res<Option<SiteBillingConfig>>;
}

/// Postgres implementation of both stores.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn find_by_id(&self, plan_id: Uuid) -> Res<Option<Plan>> {
        db::plan::get_plan_by_id(&*self.pool, plan_id).await
    }

    async fn list_linked_by_site(&self, site_id: &str) -> Res<Vec<Plan>> {
        db::plan::get_linked_plans_by_site(&*self.pool, site_id).await
    }

    async fn insert(&self, data: PlanCreateRequest) -> Res<Plan> {
        db::plan::insert_plan(&*self.pool, data).await
    }

    async fn update(&self, plan_id: Uuid, data: PlanUpdateRequest) -> Res<Option<Plan>> {
        db::plan::update_plan(&*self.pool, plan_id, data).await
    }

    async fn record_stripe_links(&self, data: StripeLinkUpdate) -> Res<Plan> {
        db::plan::record_stripe_links(&*self.pool, data).await
    }
}

#[async_trait]
impl SiteConfigStore for PgStore {
    async fn billing_config(&self, site_id: &str) -> Res<Option<SiteBillingConfig>> {
        db::site::get_billing_config(&*self.pool, site_id).await
    }
}
