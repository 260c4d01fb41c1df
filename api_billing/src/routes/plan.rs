use actix_web::{
    Responder, get, patch, post,
    web::{self},
};
use common::{error::Res, http::Success};
use uuid::Uuid;

use crate::{
    dtos::plan::{PlanCreateBody, PlanUpdateBody, PlanView},
    services::billing::BillingService,
};

/// Creates a plan. Nothing is published to Stripe yet.
///
/// # Input
///
/// `{ siteId, name, description?, priceAmount, billingPeriod? }`
#[post("/plans")]
pub async fn post_plan(
    service: web::Data<BillingService>,
    req: web::Json<PlanCreateBody>,
) -> Res<impl Responder> {
    let plan = service.create_plan(req.into_inner()).await?;
    Success::created(PlanView::from(plan))
}

#[get("/plans/{plan_id}")]
pub async fn get_plan(
    service: web::Data<BillingService>,
    plan_id: web::Path<Uuid>,
) -> Res<impl Responder> {
    let plan = service.get_plan(plan_id.into_inner()).await?;
    Success::ok(PlanView::from(plan))
}

/// Partially updates a plan.
///
/// Price or period changes reach Stripe on the next `PUT /billing/products`.
#[patch("/plans/{plan_id}")]
pub async fn patch_plan(
    service: web::Data<BillingService>,
    plan_id: web::Path<Uuid>,
    req: web::Json<PlanUpdateBody>,
) -> Res<impl Responder> {
    let plan = service
        .update_plan(plan_id.into_inner(), req.into_inner())
        .await?;
    Success::ok(PlanView::from(plan))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web};
    use common::http::{json_config, path_config};
    use serde_json::{Value, json};

    use crate::{mount_billing, testing::Harness};

    #[actix_web::test]
    async fn plan_lifecycle_over_http() {
        let h = Harness::configured();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(h.service.clone()))
                .app_data(json_config())
                .service(mount_billing()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/billing/plans")
            .set_json(json!({
                "siteId": "site-1",
                "name": "Domiciliation Pro",
                "priceAmount": 29.9,
                "billingPeriod": "quarterly"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["priceAmount"], 29.9);
        assert_eq!(created["billingPeriod"], "quarterly");
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/billing/plans/{}", id))
            .set_json(json!({ "name": "Domiciliation Premium" }))
            .to_request();
        let patched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(patched["name"], "Domiciliation Premium");
        assert_eq!(patched["priceAmount"], 29.9);
        assert_eq!(patched["version"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/billing/plans/{}", id))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, patched);
    }

    #[actix_web::test]
    async fn unknown_or_malformed_ids() {
        let h = Harness::configured();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(h.service.clone()))
                .app_data(path_config())
                .service(mount_billing()),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/billing/plans/{}", uuid::Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/billing/plans/not-a-uuid")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
