use actix_web::{
    Responder, get, post, put,
    web::{self},
};
use common::{error::Res, http::Success};

use crate::{
    dtos::product::{
        CreateProductResponse, ProductSyncRequest, SyncedPlansQuery, UpdateProductResponse,
    },
    services::billing::{BillingService, SyncCommand},
};

/// Publishes a plan to Stripe.
///
/// # Input
///
/// `{ planId, siteId, mode?, useStoredCredentials?, suppliedSecretKey? }`
///
/// # Output
///
/// `{ success, plan, stripeProduct, stripePrice }`. A plan already published
/// in the mode is re-synced instead.
#[post("/products")]
pub async fn post_product(
    service: web::Data<BillingService>,
    req: web::Json<ProductSyncRequest>,
) -> Res<impl Responder> {
    let cmd = SyncCommand::try_from(req.into_inner())?;
    let outcome = service.create_product_and_price(cmd).await?;
    Success::ok(CreateProductResponse {
        success: true,
        plan: outcome.plan.into(),
        stripe_product: outcome.product,
        stripe_price: outcome.price,
    })
}

/// Lists the plans of a site that are linked to a Stripe product.
///
/// Never contacts Stripe.
#[get("/products")]
pub async fn get_products(
    service: web::Data<BillingService>,
    query: web::Query<SyncedPlansQuery>,
) -> Res<impl Responder> {
    let site_id = query.into_inner().site_id.unwrap_or_default();
    let plans = service.list_synced_plans(site_id.trim()).await?;
    Success::ok(plans)
}

/// Re-syncs a published plan.
///
/// # Output
///
/// `{ success, stripeProduct, stripePriceId, priceRefreshSucceeded }`
#[put("/products")]
pub async fn put_product(
    service: web::Data<BillingService>,
    req: web::Json<ProductSyncRequest>,
) -> Res<impl Responder> {
    let cmd = SyncCommand::try_from(req.into_inner())?;
    let outcome = service.update_product_and_price(cmd).await?;
    Success::ok(UpdateProductResponse {
        success: true,
        stripe_product: outcome.product,
        stripe_price_id: outcome.price_id,
        price_refresh_succeeded: outcome.price_refresh_succeeded,
    })
}
