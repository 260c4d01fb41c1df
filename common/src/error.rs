use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Billing configuration error: {0}")]
    Configuration(String),

    /// Message from the credential verifier, passed through untouched.
    #[error("{0}")]
    CredentialRejected(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),

    #[error("Stripe request timed out: {0}")]
    GatewayTimeout(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Configuration(_)
            | AppError::CredentialRejected(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_)
            | AppError::Reqwest(_)
            | AppError::Stripe(_)
            | AppError::GatewayTimeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Gateway failures, as opposed to local validation or storage errors.
    pub fn is_gateway(&self) -> bool {
        matches!(self, AppError::Stripe(_) | AppError::GatewayTimeout(_))
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };

        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
            return HttpResponse::build(status).json(to_internal_json(&self.to_string()));
        }

        HttpResponse::build(status).json(serde_json::json!({ "error": self.to_string() }))
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
