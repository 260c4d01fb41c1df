use chrono::NaiveDateTime;
use common::billing::{BillingMode, BillingPeriod};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub site_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub billing_period: String,
    pub stripe_mode: Option<String>,
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

impl Plan {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::from_stored(Some(self.billing_period.as_str()))
    }

    pub fn mode(&self) -> Option<BillingMode> {
        self.stripe_mode.as_deref().and_then(BillingMode::parse)
    }

    /// Product linked for `mode`.
    ///
    /// The legacy mirror is only trusted when it was last written in the same
    /// mode; the other mode's columns are never consulted.
    pub fn product_id_for(&self, mode: BillingMode) -> Option<&str> {
        let scoped = match mode {
            BillingMode::Test => self.stripe_product_id_test.as_deref(),
            BillingMode::Live => self.stripe_product_id_live.as_deref(),
        };
        scoped.or(self.legacy(mode, &self.stripe_product_id))
    }

    pub fn price_id_for(&self, mode: BillingMode) -> Option<&str> {
        let scoped = match mode {
            BillingMode::Test => self.stripe_price_id_test.as_deref(),
            BillingMode::Live => self.stripe_price_id_live.as_deref(),
        };
        scoped.or(self.legacy(mode, &self.stripe_price_id))
    }

    fn legacy<'a>(&self, mode: BillingMode, field: &'a Option<String>) -> Option<&'a str> {
        if self.mode() == Some(mode) {
            field.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        let now = chrono::Utc::now().naive_utc();
        Plan {
            id: Uuid::new_v4(),
            site_id: "site-1".to_string(),
            name: "Starter".to_string(),
            description: None,
            price_cents: 1000,
            billing_period: "yearly".to_string(),
            stripe_mode: None,
            stripe_product_id_test: None,
            stripe_price_id_test: None,
            stripe_product_id_live: None,
            stripe_price_id_live: None,
            stripe_product_id: Some("prod_legacy".to_string()),
            stripe_price_id: Some("price_legacy".to_string()),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn legacy_ids_only_count_for_their_own_mode() {
        let mut p = plan();
        assert_eq!(p.product_id_for(BillingMode::Test), None);

        p.stripe_mode = Some("test".to_string());
        assert_eq!(p.product_id_for(BillingMode::Test), Some("prod_legacy"));
        assert_eq!(p.price_id_for(BillingMode::Test), Some("price_legacy"));
        assert_eq!(p.product_id_for(BillingMode::Live), None);

        p.stripe_product_id_live = Some("prod_live".to_string());
        assert_eq!(p.product_id_for(BillingMode::Live), Some("prod_live"));
    }

    #[test]
    fn unknown_period_reads_as_monthly() {
        assert_eq!(plan().period(), BillingPeriod::Monthly);
    }
}
