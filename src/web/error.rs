use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors surfaced by the HTTP layer. The score engine itself never fails.
#[derive(Debug)]
pub enum ApiError {
    /// No payment-proof token on the request
    PaymentRequired { detail: String },
    /// Body could not be parsed or failed validation
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PaymentRequired { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn detail(&self) -> &str {
        match self {
            ApiError::PaymentRequired { detail } => detail,
            ApiError::InvalidRequest(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.detail() });
        (self.status(), Json(body)).into_response()
    }
}
