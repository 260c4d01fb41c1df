//! In-memory doubles for the billing ports.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use common::{
    billing::{BillingMode, SecretKey},
    error::{AppError, Res},
};
use db::{
    dtos::plan::{PlanCreateRequest, PlanUpdateRequest, StripeLinkUpdate},
    models::{plan::Plan, site::SiteBillingConfig},
};
use uuid::Uuid;

use crate::services::{
    billing::BillingService,
    credentials::CredentialVerifier,
    gateway::{BillingGateway, CURRENCY, PriceParams, ProductParams, RemotePrice, RemoteProduct},
    store::{PlanStore, SiteConfigStore},
};

pub(crate) const SITE_ID: &str = "site-1";

pub(crate) fn plan_fixture(price_cents: i64, billing_period: &str) -> Plan {
    let now = Utc::now().naive_utc();
    Plan {
        id: Uuid::new_v4(),
        site_id: SITE_ID.to_string(),
        name: "Domiciliation Pro".to_string(),
        description: Some("Adresse commerciale et réception du courrier".to_string()),
        price_cents,
        billing_period: billing_period.to_string(),
        stripe_mode: None,
        stripe_product_id_test: None,
        stripe_price_id_test: None,
        stripe_product_id_live: None,
        stripe_price_id_live: None,
        stripe_product_id: None,
        stripe_price_id: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn site_fixture() -> SiteBillingConfig {
    SiteBillingConfig {
        site_id: SITE_ID.to_string(),
        is_configured: true,
        test_mode: true,
        secret_key: Some("sk_legacy_site1".to_string()),
        test_secret_key: Some("sk_test_site1".to_string()),
        live_secret_key: Some("sk_live_site1".to_string()),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Gateway
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GatewayCall {
    CreateProduct,
    UpdateProduct(String),
    ArchiveProduct(String),
    /// Unit amount of the requested price.
    CreatePrice(i64),
    RetrievePrice(String),
    ArchivePrice(String),
}

#[derive(Default)]
struct GatewayState {
    products: HashMap<String, RemoteProduct>,
    prices: HashMap<String, RemotePrice>,
    calls: Vec<GatewayCall>,
    keys: Vec<String>,
    failing: HashSet<&'static str>,
    next_id: u32,
    last_product: Option<String>,
}

impl GatewayState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{:04}", prefix, self.next_id)
    }
}

/// Records every call and never offers deletion, like the real port.
#[derive(Default)]
pub(crate) struct MockGateway {
    state: Mutex<GatewayState>,
}

impl MockGateway {
    pub(crate) fn fail_on(&self, method: &'static str) {
        self.state.lock().unwrap().failing.insert(method);
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn count(&self, filter: impl Fn(&GatewayCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| filter(c))
            .count()
    }

    pub(crate) fn keys_used(&self) -> Vec<String> {
        self.state.lock().unwrap().keys.clone()
    }

    pub(crate) fn price(&self, price_id: &str) -> Option<RemotePrice> {
        self.state.lock().unwrap().prices.get(price_id).cloned()
    }

    pub(crate) fn last_product_id(&self) -> Option<String> {
        self.state.lock().unwrap().last_product.clone()
    }

    /// Registers a product without going through the call log.
    pub(crate) fn seed_product(&self) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("prod");
        state.products.insert(
            id.clone(),
            RemoteProduct {
                id: id.clone(),
                name: Some("Seeded".to_string()),
                description: None,
                active: true,
                metadata: HashMap::new(),
            },
        );
        id
    }

    fn begin(&self, method: &'static str, key: &SecretKey, call: GatewayCall) -> Res<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.keys.push(key.expose().to_string());
        if state.failing.contains(method) {
            return Err(AppError::Stripe(stripe::StripeError::ClientError(format!(
                "simulated {} failure",
                method
            ))));
        }
        Ok(())
    }
}

fn no_such(kind: &str, id: &str) -> AppError {
    AppError::Stripe(stripe::StripeError::ClientError(format!(
        "No such {}: '{}'",
        kind, id
    )))
}

#[async_trait]
impl BillingGateway for MockGateway {
    async fn create_product(&self, key: &SecretKey, params: &ProductParams) -> Res<RemoteProduct> {
        self.begin("create_product", key, GatewayCall::CreateProduct)?;
        let mut state = self.state.lock().unwrap();
        let product = RemoteProduct {
            id: state.next_id("prod"),
            name: Some(params.name.clone()),
            description: Some(params.description.clone()),
            active: true,
            metadata: params.metadata.clone(),
        };
        state.products.insert(product.id.clone(), product.clone());
        state.last_product = Some(product.id.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        key: &SecretKey,
        product_id: &str,
        params: &ProductParams,
    ) -> Res<RemoteProduct> {
        self.begin(
            "update_product",
            key,
            GatewayCall::UpdateProduct(product_id.to_string()),
        )?;
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| no_such("product", product_id))?;
        product.name = Some(params.name.clone());
        product.description = Some(params.description.clone());
        product.metadata = params.metadata.clone();
        Ok(product.clone())
    }

    async fn archive_product(&self, key: &SecretKey, product_id: &str) -> Res<()> {
        self.begin(
            "archive_product",
            key,
            GatewayCall::ArchiveProduct(product_id.to_string()),
        )?;
        let mut state = self.state.lock().unwrap();
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| no_such("product", product_id))?;
        product.active = false;
        Ok(())
    }

    async fn create_price(&self, key: &SecretKey, params: &PriceParams) -> Res<RemotePrice> {
        self.begin(
            "create_price",
            key,
            GatewayCall::CreatePrice(params.unit_amount),
        )?;
        let mut state = self.state.lock().unwrap();
        if !state.products.contains_key(&params.product_id) {
            return Err(no_such("product", &params.product_id));
        }
        let price = RemotePrice {
            id: state.next_id("price"),
            product_id: Some(params.product_id.clone()),
            unit_amount: Some(params.unit_amount),
            currency: Some(CURRENCY.to_string()),
            interval: Some(params.interval),
            active: true,
        };
        state.prices.insert(price.id.clone(), price.clone());
        Ok(price)
    }

    async fn retrieve_price(&self, key: &SecretKey, price_id: &str) -> Res<RemotePrice> {
        self.begin(
            "retrieve_price",
            key,
            GatewayCall::RetrievePrice(price_id.to_string()),
        )?;
        self.state
            .lock()
            .unwrap()
            .prices
            .get(price_id)
            .cloned()
            .ok_or_else(|| no_such("price", price_id))
    }

    async fn archive_price(&self, key: &SecretKey, price_id: &str) -> Res<()> {
        self.begin(
            "archive_price",
            key,
            GatewayCall::ArchivePrice(price_id.to_string()),
        )?;
        let mut state = self.state.lock().unwrap();
        let price = state
            .prices
            .get_mut(price_id)
            .ok_or_else(|| no_such("price", price_id))?;
        price.active = false;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Stores
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub(crate) struct MockPlanStore {
    plans: Mutex<HashMap<Uuid, Plan>>,
    edit_during_link: AtomicBool,
}

impl MockPlanStore {
    pub(crate) fn put(&self, plan: Plan) {
        self.plans.lock().unwrap().insert(plan.id, plan);
    }

    pub(crate) fn get(&self, plan_id: Uuid) -> Option<Plan> {
        self.plans.lock().unwrap().get(&plan_id).cloned()
    }

    /// Simulates another writer bumping the plan right before the next link write.
    pub(crate) fn edit_during_next_link(&self) {
        self.edit_during_link.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlanStore for MockPlanStore {
    async fn find_by_id(&self, plan_id: Uuid) -> Res<Option<Plan>> {
        Ok(self.get(plan_id))
    }

    async fn list_linked_by_site(&self, site_id: &str) -> Res<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.site_id == site_id)
            .filter(|p| {
                p.stripe_product_id.is_some()
                    || p.stripe_product_id_test.is_some()
                    || p.stripe_product_id_live.is_some()
            })
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.created_at);
        Ok(plans)
    }

    async fn insert(&self, data: PlanCreateRequest) -> Res<Plan> {
        let mut plan = plan_fixture(data.price_cents, data.billing_period.as_str());
        plan.site_id = data.site_id;
        plan.name = data.name;
        plan.description = data.description;
        self.put(plan.clone());
        Ok(plan)
    }

    async fn update(&self, plan_id: Uuid, data: PlanUpdateRequest) -> Res<Option<Plan>> {
        let mut plans = self.plans.lock().unwrap();
        let Some(plan) = plans.get_mut(&plan_id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            plan.name = name;
        }
        if let Some(description) = data.description {
            plan.description = description;
        }
        if let Some(price_cents) = data.price_cents {
            plan.price_cents = price_cents;
        }
        if let Some(period) = data.billing_period {
            plan.billing_period = period.as_str().to_string();
        }
        plan.version += 1;
        plan.updated_at = Utc::now().naive_utc();
        Ok(Some(plan.clone()))
    }

    async fn record_stripe_links(&self, data: StripeLinkUpdate) -> Res<Plan> {
        let mut plans = self.plans.lock().unwrap();
        let conflict = || AppError::Conflict(format!("Plan {} was modified", data.plan_id));
        let plan = plans.get_mut(&data.plan_id).ok_or_else(conflict)?;
        if self.edit_during_link.swap(false, Ordering::SeqCst) {
            plan.version += 1;
        }
        if plan.version != data.expected_version {
            return Err(conflict());
        }

        match data.mode {
            BillingMode::Test => {
                plan.stripe_product_id_test = Some(data.product_id.clone());
                plan.stripe_price_id_test = Some(data.price_id.clone());
            }
            BillingMode::Live => {
                plan.stripe_product_id_live = Some(data.product_id.clone());
                plan.stripe_price_id_live = Some(data.price_id.clone());
            }
        }
        plan.stripe_product_id = Some(data.product_id.clone());
        plan.stripe_price_id = Some(data.price_id.clone());
        plan.stripe_mode = Some(data.mode.as_str().to_string());
        plan.version += 1;
        plan.updated_at = Utc::now().naive_utc();
        Ok(plan.clone())
    }
}

#[derive(Default)]
pub(crate) struct MockSiteStore {
    configs: Mutex<HashMap<String, SiteBillingConfig>>,
}

#[async_trait]
impl SiteConfigStore for MockSiteStore {
    async fn billing_config(&self, site_id: &str) -> Res<Option<SiteBillingConfig>> {
        Ok(self.configs.lock().unwrap().get(site_id).cloned())
    }
}

/// Accepts any key starting with `sk_`.
#[derive(Default)]
pub(crate) struct MockVerifier {
    calls: Mutex<Vec<BillingMode>>,
}

impl MockVerifier {
    pub(crate) fn calls(&self) -> Vec<BillingMode> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify(
        &self,
        _config: &SiteBillingConfig,
        mode: BillingMode,
        supplied: &SecretKey,
    ) -> Res<SecretKey> {
        self.calls.lock().unwrap().push(mode);
        if supplied.expose().starts_with("sk_") {
            Ok(supplied.clone())
        } else {
            Err(AppError::CredentialRejected(
                "Invalid Stripe secret key".to_string(),
            ))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Harness
// ════════════════════════════════════════════════════════════════════════════

pub(crate) struct Harness {
    pub(crate) service: Arc<BillingService>,
    pub(crate) gateway: Arc<MockGateway>,
    pub(crate) plans: Arc<MockPlanStore>,
    pub(crate) verifier: Arc<MockVerifier>,
}

impl Harness {
    pub(crate) fn with_site(configure: impl FnOnce(&mut SiteBillingConfig)) -> Self {
        let mut site = site_fixture();
        configure(&mut site);

        let gateway = Arc::new(MockGateway::default());
        let plans = Arc::new(MockPlanStore::default());
        let sites = Arc::new(MockSiteStore::default());
        sites
            .configs
            .lock()
            .unwrap()
            .insert(site.site_id.clone(), site);
        let verifier = Arc::new(MockVerifier::default());

        let service = Arc::new(BillingService::new(
            gateway.clone(),
            plans.clone(),
            sites,
            verifier.clone(),
        ));
        Harness {
            service,
            gateway,
            plans,
            verifier,
        }
    }

    pub(crate) fn configured() -> Self {
        Self::with_site(|_| {})
    }

    pub(crate) fn unconfigured() -> Self {
        Self::with_site(|site| site.is_configured = false)
    }

    pub(crate) fn add_plan(&self, plan: Plan) -> Plan {
        self.plans.put(plan.clone());
        plan
    }

    pub(crate) fn plan(&self, plan_id: Uuid) -> Plan {
        self.plans.get(plan_id).unwrap()
    }

    /// Admin edit of the amount, outside of any sync.
    pub(crate) fn edit_price(&self, plan_id: Uuid, price_cents: i64) {
        let mut plan = self.plan(plan_id);
        plan.price_cents = price_cents;
        plan.version += 1;
        self.plans.put(plan);
    }

    pub(crate) fn edit_period(&self, plan_id: Uuid, billing_period: &str) {
        let mut plan = self.plan(plan_id);
        plan.billing_period = billing_period.to_string();
        plan.version += 1;
        self.plans.put(plan);
    }
}
