//! Secret key resolution for a site and billing mode.

use async_trait::async_trait;
use common::{
    billing::{BillingMode, SecretKey},
    env_config::CredentialVerifierConfig,
    error::{AppError, Res},
};
use db::models::site::SiteBillingConfig;
use serde::{Deserialize, Serialize};

/// Where the caller wants the Stripe key to come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Stored,
    Supplied(SecretKey),
}

/// Verifies (and decrypts if needed) a caller-supplied key against the site's
/// stored configuration.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        config: &SiteBillingConfig,
        mode: BillingMode,
        supplied: &SecretKey,
    ) -> Res<SecretKey>;
}

/// Picks the stored key for `mode`.
///
/// Test mode falls back to the legacy single key. Live mode has no fallback,
/// and neither mode ever borrows the other mode's key.
pub fn select_stored_key(config: &SiteBillingConfig, mode: BillingMode) -> Res<SecretKey> {
    let key = match mode {
        BillingMode::Test => SecretKey::from_optional(config.test_secret_key.as_deref())
            .or_else(|| SecretKey::from_optional(config.secret_key.as_deref())),
        BillingMode::Live => SecretKey::from_optional(config.live_secret_key.as_deref()),
    };
    key.ok_or_else(|| {
        AppError::Configuration(format!(
            "No Stripe secret key configured for {} mode on site {}",
            mode, config.site_id
        ))
    })
}

pub async fn resolve_key(
    verifier: &dyn CredentialVerifier,
    config: &SiteBillingConfig,
    mode: BillingMode,
    source: &CredentialSource,
) -> Res<SecretKey> {
    match source {
        CredentialSource::Stored => select_stored_key(config, mode),
        CredentialSource::Supplied(key) => verifier.verify(config, mode, key).await,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyKeyRequest<'a> {
    site_id: &'a str,
    config_type: &'static str,
    mode: BillingMode,
    secret_key: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyKeyResponse {
    secret_key: Option<String>,
    error: Option<String>,
}

/// Calls the back-office key verification endpoint.
pub struct HttpCredentialVerifier {
    client: reqwest::Client,
    config: CredentialVerifierConfig,
}

impl HttpCredentialVerifier {
    pub fn new(config: CredentialVerifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CredentialVerifier for HttpCredentialVerifier {
    async fn verify(
        &self,
        config: &SiteBillingConfig,
        mode: BillingMode,
        supplied: &SecretKey,
    ) -> Res<SecretKey> {
        let mut request = self.client.post(&self.config.url).json(&VerifyKeyRequest {
            site_id: &config.site_id,
            config_type: "stripe",
            mode,
            secret_key: supplied.expose(),
        });
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<VerifyKeyResponse>().await.ok();

        interpret_verification(status, body)
    }
}

fn interpret_verification(
    status: reqwest::StatusCode,
    body: Option<VerifyKeyResponse>,
) -> Res<SecretKey> {
    match body {
        Some(VerifyKeyResponse {
            secret_key: Some(key),
            ..
        }) if status.is_success() => SecretKey::from_optional(Some(key.as_str())).ok_or_else(|| {
            AppError::CredentialRejected("Verified secret key is empty".to_string())
        }),
        Some(VerifyKeyResponse {
            error: Some(error), ..
        }) => Err(AppError::CredentialRejected(error)),
        _ if status.is_server_error() => Err(AppError::Internal(format!(
            "Key verification endpoint failed with status {}",
            status
        ))),
        _ => Err(AppError::CredentialRejected(format!(
            "Key verification failed with status {}",
            status
        ))),
    }
}
