use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rota_availability::AvailabilityError;
use rota_booking::CheckoutError;
use rota_core::DataSourceError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// Slot filled up; the session was sent back to time selection
    Conflict(String),
    Unprocessable { code: &'static str, message: String },
    PaymentRequired(String),
    Upstream(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "slot_taken", msg),
            AppError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            AppError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, "payment_declined", msg),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "upstream", "Upstream service failed".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<DataSourceError> for AppError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Source(e) => e.into(),
            AvailabilityError::Superseded => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::WrongStep(_) => AppError::Unprocessable {
                code: "wrong_step",
                message: err.to_string(),
            },
            CheckoutError::Incomplete(ref blocker) => AppError::Unprocessable {
                code: blocker.code(),
                message: err.to_string(),
            },
            CheckoutError::SlotTaken(_) => AppError::Conflict(err.to_string()),
            CheckoutError::PaymentDeclined(reason) => AppError::PaymentRequired(reason),
            CheckoutError::Commit(e) => AppError::Upstream(e.to_string()),
        }
    }
}
