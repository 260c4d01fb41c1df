use chrono::NaiveDateTime;
use common::billing::{BillingMode, BillingPeriod, from_minor_units};
use db::models::plan::Plan;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCreateBody {
    pub site_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Major units (euros).
    pub price_amount: f64,
    pub billing_period: Option<BillingPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdateBody {
    pub name: Option<String>,
    /// Absent leaves the description alone, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub price_amount: Option<f64>,
    pub billing_period: Option<BillingPeriod>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Plan as exposed over HTTP, amounts back in major units.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: Uuid,
    pub site_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_amount: f64,
    pub billing_period: BillingPeriod,
    pub stripe_mode: Option<BillingMode>,
    pub stripe_product_id_test: Option<String>,
    pub stripe_price_id_test: Option<String>,
    pub stripe_product_id_live: Option<String>,
    pub stripe_price_id_live: Option<String>,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Plan> for PlanView {
    fn from(plan: Plan) -> Self {
        PlanView {
            price_amount: from_minor_units(plan.price_cents),
            billing_period: plan.period(),
            stripe_mode: plan.mode(),
            id: plan.id,
            site_id: plan.site_id,
            name: plan.name,
            description: plan.description,
            stripe_product_id_test: plan.stripe_product_id_test,
            stripe_price_id_test: plan.stripe_price_id_test,
            stripe_product_id_live: plan.stripe_product_id_live,
            stripe_price_id_live: plan.stripe_price_id_live,
            stripe_product_id: plan.stripe_product_id,
            stripe_price_id: plan.stripe_price_id,
            version: plan.version,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}
