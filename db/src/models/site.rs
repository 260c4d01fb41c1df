use sqlx::FromRow;

/// Stripe settings stored for a site. Keys stay inside this struct and are
/// never serialized.
#[derive(Clone, FromRow)]
pub struct SiteBillingConfig {
    pub site_id: String,
    pub is_configured: bool,
    pub test_mode: bool,
    /// Legacy single key, accepted as a fallback for test mode only.
    pub secret_key: Option<String>,
    pub test_secret_key: Option<String>,
    pub live_secret_key: Option<String>,
}

impl std::fmt::Debug for SiteBillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteBillingConfig")
            .field("site_id", &self.site_id)
            .field("is_configured", &self.is_configured)
            .field("test_mode", &self.test_mode)
            .finish_non_exhaustive()
    }
}
