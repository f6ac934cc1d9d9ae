use std::collections::HashMap;

use chrono::Local;
use serde_json::Value;

use crate::config::UnionPayConfig;
use crate::constants::{GATEWAY_UNAVAILABLE, NOTIFY_ACK, REQUEST_TIMEOUT, SIGN_FIELD, SUCCESS_CODE};
use crate::error::UnionPayError;
use crate::request::PaymentRequest;
use crate::response::{decode_response, GatewayResponse};
use crate::signature::{params_from_pairs, verify_signature, Params};

/// Verified fields of an inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification<'a> {
    pub bill_no: &'a str,
    pub bill_status: &'a str,
}

/// Gateway client holding one merchant terminal's credentials.
///
/// Cheap to share: the credentials are immutable and `reqwest::Client`
/// pools connections internally.
#[derive(Debug, Clone)]
pub struct UnionPayClient {
    http: reqwest::Client,
    config: UnionPayConfig,
}

impl UnionPayClient {
    pub fn new(config: UnionPayConfig) -> Result<Self, UnionPayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UnionPayError::HttpError(format!("failed to build HTTP client: {e}")))?;
        Self::with_http_client(config, http)
    }

    /// Use a caller-provided `reqwest::Client`. The 15 s timeout is still
    /// applied per request.
    pub fn with_http_client(
        config: UnionPayConfig,
        http: reqwest::Client,
    ) -> Result<Self, UnionPayError> {
        config.validate()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self, UnionPayError> {
        Self::new(UnionPayConfig::from_env()?)
    }

    pub fn config(&self) -> &UnionPayConfig {
        &self.config
    }

    /// Request a QR code for a bill and return its payload.
    pub async fn pay(
        &self,
        trade_no: &str,
        amount: u64,
        notify_url: Option<&str>,
        return_url: Option<&str>,
    ) -> Result<String, UnionPayError> {
        let request = PaymentRequest {
            trade_no: trade_no.to_string(),
            amount,
            notify_url: notify_url.map(String::from),
            return_url: return_url.map(String::from),
        };
        self.submit(&request).await
    }

    /// Same as [`pay`](Self::pay), taking a prepared [`PaymentRequest`].
    pub async fn submit(&self, request: &PaymentRequest) -> Result<String, UnionPayError> {
        request.validate()?;

        let params = request.to_signed_params(&self.config, Local::now().naive_local());

        tracing::info!(
            trade_no = %request.trade_no,
            amount = request.amount,
            "requesting bill QR code"
        );

        let response = self.post(&params).await?;
        let result = qr_code_from_response(response);

        match &result {
            Ok(_) => tracing::info!(trade_no = %request.trade_no, "bill QR code issued"),
            Err(e) => tracing::warn!(trade_no = %request.trade_no, error = %e, "bill QR code request rejected"),
        }
        result
    }

    /// POST a signed parameter set and decode whatever comes back.
    ///
    /// Error statuses are not transport failures: a rejection with a body is
    /// decoded like any other reply.
    async fn post(&self, params: &Params) -> Result<Option<GatewayResponse>, UnionPayError> {
        let resp = self
            .http
            .post(self.config.api_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(params)
            .send()
            .await
            .map_err(|e| UnionPayError::HttpError(format!("gateway request failed: {e}")))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = resp
            .bytes()
            .await
            .map_err(|e| UnionPayError::HttpError(format!("failed to read gateway reply: {e}")))?;

        if !status.is_success() {
            tracing::warn!(status = %status, content_type = %content_type, "gateway replied with error status");
        }

        Ok(decode_response(&content_type, &body))
    }

    /// Check an inbound notification's signature.
    ///
    /// Only `sign` is mandatory. A signed payload without `billNo` or
    /// `billStatus` is still genuine; those come back as empty strings.
    pub fn verify_notification<'a>(
        &self,
        form: &'a HashMap<String, String>,
    ) -> Result<Notification<'a>, UnionPayError> {
        let sign = form
            .get(SIGN_FIELD)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UnionPayError::ValidationError("missing parameters".to_string()))?;

        let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();
        let bill_no = field("billNo");
        let bill_status = field("billStatus");

        let params = params_from_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if !verify_signature(&params, &self.config.key, sign) {
            tracing::warn!(bill_no = %bill_no, "notification signature mismatch");
            return Err(UnionPayError::SignatureError(
                "notification signature verification failed".to_string(),
            ));
        }

        Ok(Notification {
            bill_no,
            bill_status,
        })
    }

    /// Verify a notification, hand `(billNo, billStatus)` to `callback` and
    /// return the acknowledgment body the gateway expects.
    ///
    /// The callback runs only after the signature checks out. Its error, if
    /// any, is returned as [`UnionPayError::Callback`].
    pub fn notify<F, E>(
        &self,
        form: &HashMap<String, String>,
        callback: F,
    ) -> Result<&'static str, UnionPayError>
    where
        F: FnOnce(&str, &str) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let notification = self.verify_notification(form)?;

        tracing::info!(
            bill_no = %notification.bill_no,
            bill_status = %notification.bill_status,
            "payment notification verified"
        );

        callback(notification.bill_no, notification.bill_status)
            .map_err(|e| UnionPayError::Callback(e.into()))?;

        Ok(NOTIFY_ACK)
    }
}

/// Pull the QR payload out of a decoded reply.
pub fn qr_code_from_response(response: Option<GatewayResponse>) -> Result<String, UnionPayError> {
    let unavailable = || UnionPayError::GatewayError(GATEWAY_UNAVAILABLE.to_string());

    let response = response.ok_or_else(unavailable)?;
    let err_code = response.get("errCode").ok_or_else(unavailable)?;

    if err_code.as_str() != Some(SUCCESS_CODE) {
        let message = match response.get("errMsg") {
            Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
            _ => match err_code {
                Value::String(code) => format!("gateway rejected the request: {code}"),
                other => format!("gateway rejected the request: {other}"),
            },
        };
        return Err(UnionPayError::GatewayError(message));
    }

    match response.get("billQRCode") {
        Some(Value::String(qr)) if !qr.is_empty() => Ok(qr.clone()),
        _ => Err(unavailable()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::create_signature;
    use serde_json::json;

    fn client() -> UnionPayClient {
        let config =
            UnionPayConfig::new("WWW.TEST.COM", "3194", "898340149000005", "88880001", "test-key")
                .unwrap();
        UnionPayClient::new(config).unwrap()
    }

    fn map(value: Value) -> Option<GatewayResponse> {
        match value {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    fn signed_form(key: &str) -> HashMap<String, String> {
        let mut form: HashMap<String, String> = [
            ("billNo", "3194T1001"),
            ("billStatus", "PAID"),
            ("totalAmount", "100"),
            ("mid", "898340149000005"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let params = params_from_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        form.insert("sign".to_string(), create_signature(&params, key).to_uppercase());
        form
    }

    #[test]
    fn test_qr_code_success() {
        let resp = map(json!({"errCode": "SUCCESS", "billQRCode": "qr://abc"}));
        assert_eq!(qr_code_from_response(resp).unwrap(), "qr://abc");
    }

    #[test]
    fn test_qr_code_gateway_failure_message() {
        let resp = map(json!({"errCode": "FAIL", "errMsg": "insufficient limit"}));
        let err = qr_code_from_response(resp).unwrap_err();
        assert!(matches!(err, UnionPayError::GatewayError(ref m) if m == "insufficient limit"));
    }

    #[test]
    fn test_qr_code_failure_without_message() {
        let resp = map(json!({"errCode": "BAD_SIGN"}));
        let err = qr_code_from_response(resp).unwrap_err();
        assert_eq!(err.message(), "gateway rejected the request: BAD_SIGN");
    }

    #[test]
    fn test_qr_code_missing_err_code() {
        for resp in [map(json!({"billQRCode": "qr://abc"})), None] {
            let err = qr_code_from_response(resp).unwrap_err();
            assert!(
                matches!(err, UnionPayError::GatewayError(ref m) if m == GATEWAY_UNAVAILABLE)
            );
        }
    }

    #[test]
    fn test_qr_code_success_without_payload() {
        let err = qr_code_from_response(map(json!({"errCode": "SUCCESS"}))).unwrap_err();
        assert!(matches!(err, UnionPayError::GatewayError(_)));
    }

    #[test]
    fn test_err_code_must_be_exact() {
        let resp = map(json!({"errCode": "success", "errMsg": "lowercase", "billQRCode": "x"}));
        assert!(qr_code_from_response(resp).is_err());
    }

    #[test]
    fn test_notify_invokes_callback_once() {
        let client = client();
        let form = signed_form("test-key");
        let mut calls = Vec::new();

        let ack = client
            .notify(&form, |bill_no, status| {
                calls.push((bill_no.to_string(), status.to_string()));
                Ok::<(), std::convert::Infallible>(())
            })
            .unwrap();

        assert_eq!(ack, "SUCCESS");
        assert_eq!(calls, vec![("3194T1001".to_string(), "PAID".to_string())]);
    }

    #[test]
    fn test_notify_missing_sign() {
        let client = client();
        let mut form = signed_form("test-key");
        form.remove("sign");
        let mut called = false;

        let err = client
            .notify(&form, |_, _| {
                called = true;
                Ok::<(), String>(())
            })
            .unwrap_err();

        assert!(matches!(err, UnionPayError::ValidationError(ref m) if m == "missing parameters"));
        assert!(!called);
    }

    #[test]
    fn test_notify_empty_sign_counts_as_missing() {
        let mut form = signed_form("test-key");
        form.insert("sign".to_string(), String::new());
        assert!(matches!(
            client().verify_notification(&form),
            Err(UnionPayError::ValidationError(_))
        ));
    }

    #[test]
    fn test_notify_without_bill_status_reaches_callback() {
        let mut form: HashMap<String, String> = [("billNo", "B1"), ("totalAmount", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let params = params_from_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        form.insert("sign".to_string(), create_signature(&params, "test-key"));

        let mut calls = Vec::new();
        let ack = client()
            .notify(&form, |bill_no, status| {
                calls.push((bill_no.to_string(), status.to_string()));
                Ok::<(), String>(())
            })
            .unwrap();

        assert_eq!(ack, "SUCCESS");
        assert_eq!(calls, vec![("B1".to_string(), String::new())]);
    }

    #[test]
    fn test_notify_tampered_field() {
        let client = client();
        let mut form = signed_form("test-key");
        form.insert("totalAmount".to_string(), "1".to_string());
        let mut called = false;

        let err = client
            .notify(&form, |_, _| {
                called = true;
                Ok::<(), String>(())
            })
            .unwrap_err();

        assert!(matches!(err, UnionPayError::SignatureError(_)));
        assert!(!called);
    }

    #[test]
    fn test_notify_wrong_key() {
        let form = signed_form("someone-else");
        assert!(matches!(
            client().verify_notification(&form),
            Err(UnionPayError::SignatureError(_))
        ));
    }

    #[test]
    fn test_notify_callback_error_propagates() {
        let form = signed_form("test-key");
        let err = client()
            .notify(&form, |_, _| Err("order store unavailable"))
            .unwrap_err();
        assert!(matches!(err, UnionPayError::Callback(_)));
        assert!(err.to_string().contains("order store unavailable"));
    }
}
