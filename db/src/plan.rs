use common::{
    billing::BillingMode,
    error::{AppError, Res},
};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::plan::{PlanCreateRequest, PlanUpdateRequest, StripeLinkUpdate},
    models::plan::Plan,
};

pub async fn get_plan_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
) -> Res<Option<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(plan_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Plans of a site that are linked to a Stripe product in either mode.
pub async fn get_linked_plans_by_site<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    site_id: &str,
) -> Res<Vec<Plan>> {
    sqlx::query_as::<_, Plan>(
        r#"
        SELECT * FROM plans
        WHERE site_id = $1
          AND (stripe_product_id IS NOT NULL
               OR stripe_product_id_test IS NOT NULL
               OR stripe_product_id_live IS NOT NULL)
        ORDER BY created_at
        "#,
    )
    .bind(site_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_plan<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: PlanCreateRequest,
) -> Res<Plan> {
    sqlx::query_as::<_, Plan>(
        r#"
        INSERT INTO plans (site_id, name, description, price_cents, billing_period)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(data.site_id)
    .bind(data.name)
    .bind(data.description)
    .bind(data.price_cents)
    .bind(data.billing_period.as_str())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Merges the provided fields into the plan. Returns `None` if it does not exist.
///
/// The description is matched on presence rather than `COALESCE` so it can be cleared.
pub async fn update_plan<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    plan_id: Uuid,
    data: PlanUpdateRequest,
) -> Res<Option<Plan>> {
    let description_given = data.description.is_some();
    sqlx::query_as::<_, Plan>(
        r#"
        UPDATE plans SET
            name = COALESCE($2, name),
            description = CASE WHEN $6 THEN $3 ELSE description END,
            price_cents = COALESCE($4, price_cents),
            billing_period = COALESCE($5, billing_period),
            version = version + 1,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(plan_id)
    .bind(data.name)
    .bind(data.description.flatten())
    .bind(data.price_cents)
    .bind(data.billing_period.map(|p| p.as_str()))
    .bind(description_given)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Records the Stripe ids of one mode, mirrors them to the legacy columns and
/// refreshes `stripe_mode`/`updated_at`.
///
/// Only succeeds while the row still carries `expected_version`; a concurrent
/// write in between yields `AppError::Conflict`.
pub async fn record_stripe_links<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: StripeLinkUpdate,
) -> Res<Plan> {
    let sql = match data.mode {
        BillingMode::Test => {
            r#"
            UPDATE plans SET
                stripe_product_id_test = $2,
                stripe_price_id_test = $3,
                stripe_product_id = $2,
                stripe_price_id = $3,
                stripe_mode = $4,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $5
            RETURNING *
            "#
        }
        BillingMode::Live => {
            r#"
            UPDATE plans SET
                stripe_product_id_live = $2,
                stripe_price_id_live = $3,
                stripe_product_id = $2,
                stripe_price_id = $3,
                stripe_mode = $4,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $5
            RETURNING *
            "#
        }
    };

    sqlx::query_as::<_, Plan>(sql)
        .bind(data.plan_id)
        .bind(&data.product_id)
        .bind(&data.price_id)
        .bind(data.mode.as_str())
        .bind(data.expected_version)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Plan {} was modified during synchronization, please retry",
                data.plan_id
            ))
        })
}
