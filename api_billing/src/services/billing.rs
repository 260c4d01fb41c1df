use std::sync::Arc;

use common::billing::BillingMode;
use db::models::plan::Plan;
use uuid::Uuid;

use crate::misc::locks::SyncLocks;

use super::{
    credentials::{CredentialSource, CredentialVerifier},
    gateway::{BillingGateway, RemotePrice, RemoteProduct},
    store::{PlanStore, SiteConfigStore},
};

/// Entry point for plan administration and Stripe synchronization.
///
/// Holds the collaborators behind trait objects so the same service runs
/// against Stripe and Postgres in production and against in-memory doubles
/// in tests. One instance is shared by all workers.
pub struct BillingService {
    pub(crate) gateway: Arc<dyn BillingGateway>,
    pub(crate) plans: Arc<dyn PlanStore>,
    pub(crate) sites: Arc<dyn SiteConfigStore>,
    pub(crate) verifier: Arc<dyn CredentialVerifier>,
    pub(crate) locks: SyncLocks,
}

impl BillingService {
    pub fn new(
        gateway: Arc<dyn BillingGateway>,
        plans: Arc<dyn PlanStore>,
        sites: Arc<dyn SiteConfigStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            gateway,
            plans,
            sites,
            verifier,
            locks: SyncLocks::default(),
        }
    }
}

/// Validated input of a create or update sync.
#[derive(Debug)]
pub struct SyncCommand {
    pub plan_id: Uuid,
    pub site_id: String,
    /// Falls back to the site's default mode when absent.
    pub mode: Option<BillingMode>,
    pub credentials: CredentialSource,
}

#[derive(Debug)]
pub struct CreateOutcome {
    pub plan: Plan,
    pub product: RemoteProduct,
    /// `None` only when the plan was already linked and its current price
    /// could not be fetched.
    pub price: Option<RemotePrice>,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub plan: Plan,
    pub product: RemoteProduct,
    pub price_id: String,
    pub price: Option<RemotePrice>,
    /// `false` when the best-effort price refresh failed somewhere.
    pub price_refresh_succeeded: bool,
}

impl From<UpdateOutcome> for CreateOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        CreateOutcome {
            plan: outcome.plan,
            product: outcome.product,
            price: outcome.price,
        }
    }
}
