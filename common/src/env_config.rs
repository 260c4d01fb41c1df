use std::{env, sync::Arc, time::Duration};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to start the billing sync service: database
/// connection, bind address, worker count, CORS origin, logging switches,
/// rate limiting, Stripe call timeout and the credential verification endpoint.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// File the logger appends to.
    pub log_file: String,
    /// Global request budget per second.
    pub rate_limit_per_second: u32,
    /// Upper bound for a single Stripe API call.
    pub gateway_timeout: Duration,
    /// Endpoint that verifies caller-supplied Stripe keys.
    pub credential_verifier: CredentialVerifierConfig,
}

#[derive(Clone, Debug)]
pub struct CredentialVerifierConfig {
    pub url: String,
    /// Bearer token sent to the verifier, if it requires one.
    pub token: Option<String>,
}

impl CredentialVerifierConfig {
    /// Reads `CREDENTIAL_VERIFY_URL` and `CREDENTIAL_VERIFY_TOKEN`.
    pub fn from_env() -> Self {
        CredentialVerifierConfig {
            url: env::var("CREDENTIAL_VERIFY_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api/stripe/verify-key".to_string()),
            token: env::var("CREDENTIAL_VERIFY_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "billing-sync.log")
    /// - `RATE_LIMIT_PER_SECOND`: Global rate limit (default: 10)
    /// - `GATEWAY_TIMEOUT_SECS`: Stripe call timeout (default: 30)
    /// - `CREDENTIAL_VERIFY_URL` / `CREDENTIAL_VERIFY_TOKEN`: key verification endpoint
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "billing-sync.log".to_string()),
            rate_limit_per_second: env::var("RATE_LIMIT_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(10),
            gateway_timeout: Duration::from_secs(
                env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            credential_verifier: CredentialVerifierConfig::from_env(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
