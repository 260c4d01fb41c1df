use common::{
    billing::{BillingMode, SecretKey},
    error::{AppError, Res},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dtos::plan::PlanView,
    services::{
        billing::SyncCommand,
        credentials::CredentialSource,
        gateway::{RemotePrice, RemoteProduct},
    },
};

/// Body of `POST` and `PUT /billing/products`.
///
/// Identifiers are optional at the serde level so that a missing one is
/// reported as a regular validation error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSyncRequest {
    pub plan_id: Option<String>,
    pub site_id: Option<String>,
    pub mode: Option<BillingMode>,
    pub use_stored_credentials: Option<bool>,
    pub supplied_secret_key: Option<String>,
}

impl TryFrom<ProductSyncRequest> for SyncCommand {
    type Error = AppError;

    fn try_from(req: ProductSyncRequest) -> Res<Self> {
        let plan_id = req.plan_id.as_deref().map(str::trim).unwrap_or_default();
        let site_id = req.site_id.as_deref().map(str::trim).unwrap_or_default();
        if plan_id.is_empty() || site_id.is_empty() {
            return Err(AppError::BadRequest(
                "planId and siteId are required".to_string(),
            ));
        }
        let plan_id = plan_id
            .parse::<Uuid>()
            .map_err(|e| AppError::BadRequest(format!("Invalid planId: {}", e)))?;

        // stored credentials unless the caller explicitly opts out
        let credentials = if req.use_stored_credentials.unwrap_or(true) {
            CredentialSource::Stored
        } else {
            let key = SecretKey::from_optional(req.supplied_secret_key.as_deref()).ok_or_else(
                || {
                    AppError::BadRequest(
                        "suppliedSecretKey is required when useStoredCredentials is false"
                            .to_string(),
                    )
                },
            )?;
            CredentialSource::Supplied(key)
        };

        Ok(SyncCommand {
            plan_id,
            site_id: site_id.to_string(),
            mode: req.mode,
            credentials,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedPlansQuery {
    pub site_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub success: bool,
    pub plan: PlanView,
    pub stripe_product: RemoteProduct,
    pub stripe_price: Option<RemotePrice>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductResponse {
    pub success: bool,
    pub stripe_product: RemoteProduct,
    pub stripe_price_id: String,
    pub price_refresh_succeeded: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedPlan {
    pub plan: PlanView,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
}
