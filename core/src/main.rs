mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_billing::{
    BillingService,
    services::{credentials::HttpCredentialVerifier, store::PgStore, stripe_gateway::StripeGateway},
};
use common::{
    env_config::Config,
    http::{json_config, path_config, query_config},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    logger::setup(&config.log_file).expect("Failed to set up logger");

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");

    // one service shared by every worker, so sync locks are process-wide
    let store = Arc::new(PgStore::new(pool));
    let billing = web::Data::new(BillingService::new(
        Arc::new(StripeGateway::new(config.gateway_timeout)),
        store.clone(),
        store,
        Arc::new(HttpCredentialVerifier::new(
            config.credential_verifier.clone(),
        )),
    ));

    log::info!(
        "Billing sync listening on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(billing.clone())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .wrap(limiter::global_middleware(config_data.rate_limit_per_second)) // 3rd
            .wrap(logger::middleware(config_data.console_logging_enabled)) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(web::scope("/api").service(api_billing::mount_billing()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
