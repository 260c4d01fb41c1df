use common::billing::{BillingMode, BillingPeriod};
use uuid::Uuid;

pub struct PlanCreateRequest {
    pub site_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub billing_period: BillingPeriod,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Default)]
pub struct PlanUpdateRequest {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub price_cents: Option<i64>,
    pub billing_period: Option<BillingPeriod>,
}

/// Stripe identifiers to record for one mode after a sync.
///
/// Written to the mode's own columns and mirrored to the legacy columns.
#[derive(Debug, Clone)]
pub struct StripeLinkUpdate {
    pub plan_id: Uuid,
    pub mode: BillingMode,
    pub product_id: String,
    pub price_id: String,
    /// Version read before the sync started.
    pub expected_version: i32,
}
