use actix_web::web::{self};

pub mod routes {
    pub mod plan;
    pub mod product;
}

pub mod services {
    pub mod billing;
    pub mod credentials;
    pub mod gateway;
    pub(crate) mod plan;
    pub mod store;
    pub mod stripe_gateway;
    pub(crate) mod sync;
}

pub mod dtos {
    pub mod plan;
    pub mod product;
}

mod misc {
    pub(crate) mod locks;
}

#[cfg(test)]
pub(crate) mod testing;

pub use services::billing::BillingService;

pub fn mount_billing() -> actix_web::Scope {
    web::scope("/billing")
        .service(routes::product::post_product)
        .service(routes::product::get_products)
        .service(routes::product::put_product)
        .service(routes::plan::post_plan)
        .service(routes::plan::get_plan)
        .service(routes::plan::patch_plan)
}
