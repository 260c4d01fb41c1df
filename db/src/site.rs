use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::models::site::SiteBillingConfig;

pub async fn get_billing_config<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    site_id: &str,
) -> Res<Option<SiteBillingConfig>> {
    sqlx::query_as::<_, SiteBillingConfig>(
        r#"
        SELECT site_id, is_configured, test_mode, secret_key, test_secret_key, live_secret_key
        FROM site_billing_configs
        WHERE site_id = $1
        "#,
    )
    .bind(site_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
