use actix_web::{HttpResponse, ResponseError};
use unionpay::UnionPayError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    UnionPay(#[from] UnionPayError),

    /// No notification has been seen for this bill
    #[error("bill not found: {0}")]
    BillNotFound(String),
}

impl ResponseError for ServerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::BillNotFound(bill_no) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": "bill_not_found",
                    "message": format!("No notification received for bill '{}'", bill_no)
                }))
            }
            ServerError::UnionPay(e) => match e {
                UnionPayError::ValidationError(msg) => {
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_request",
                        "message": msg
                    }))
                }
                UnionPayError::SignatureError(msg) => {
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "signature_mismatch",
                        "message": msg
                    }))
                }
                UnionPayError::GatewayError(msg) => {
                    HttpResponse::BadGateway().json(serde_json::json!({
                        "error": "gateway_rejected",
                        "message": msg
                    }))
                }
                UnionPayError::HttpError(msg) => {
                    tracing::error!("Gateway unreachable: {}", msg);
                    HttpResponse::BadGateway().json(serde_json::json!({
                        "error": "gateway_unreachable",
                        "message": "Failed to reach the payment gateway"
                    }))
                }
                other => {
                    tracing::error!("Internal error: {}", other);
                    HttpResponse::InternalServerError().json(serde_json::json!({
                        "error": "internal_error",
                        "message": "An internal error occurred"
                    }))
                }
            },
        }
    }
}
