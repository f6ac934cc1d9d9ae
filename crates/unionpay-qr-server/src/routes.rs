use std::collections::HashMap;
use std::convert::Infallible;

use actix_web::{get, post, web, HttpResponse, Resource};
use unionpay::PaymentRequest;

use crate::error::ServerError;
use crate::state::AppState;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "unionpay-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /pay - request a QR code for a bill
pub async fn pay(
    state: web::Data<AppState>,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let qr_code = state.client.submit(&request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "billNo": request.trade_no,
        "billQRCode": qr_code,
    })))
}

/// POST /notify - payment notification from the gateway (form-encoded).
/// Replies with the plain-text acknowledgment the gateway expects.
#[post("/notify")]
pub async fn notify(
    state: web::Data<AppState>,
    form: web::Form<HashMap<String, String>>,
) -> Result<HttpResponse, ServerError> {
    let ack = state.client.notify(&form, |bill_no, status| {
        if bill_no.is_empty() {
            tracing::warn!(bill_status = %status, "signed notification without billNo, not recorded");
        } else {
            state.record(bill_no, status);
        }
        Ok::<(), Infallible>(())
    })?;

    Ok(HttpResponse::Ok().content_type("text/plain").body(ack))
}

/// GET /bills/{bill_no} - last notified status
#[get("/bills/{bill_no}")]
pub async fn bill_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let bill_no = path.into_inner();
    let record = state
        .status_of(&bill_no)
        .ok_or_else(|| ServerError::BillNotFound(bill_no.clone()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "billNo": bill_no,
        "billStatus": record.status,
        "updatedAt": record.updated_at.to_rfc3339(),
    })))
}

/// `/pay` on its own, so the binary can rate-limit it without throttling
/// gateway notifications.
pub fn pay_resource() -> Resource {
    web::resource("/pay").route(web::post().to(pay))
}

/// Routes that must never be throttled: gateway notifications and reads.
pub fn configure_unlimited(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(notify).service(bill_status);
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    configure_unlimited(cfg);
    cfg.service(pay_resource());
}
