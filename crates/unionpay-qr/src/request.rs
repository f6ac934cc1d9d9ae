use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::UnionPayConfig;
use crate::constants::{BILL_DATE_FORMAT, INST_MID, MSG_TYPE_GET_QR_CODE, TIMESTAMP_FORMAT};
use crate::error::UnionPayError;
use crate::signature::{sign_params, Params};

/// A bill to be paid by QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Merchant order number, sent as both `billNo` and `merOrderId`.
    /// The gateway treats (merchant, trade_no) as unique per bill date.
    pub trade_no: String,
    /// Total in fen.
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl PaymentRequest {
    pub fn new(trade_no: impl Into<String>, amount: u64) -> Self {
        Self {
            trade_no: trade_no.into(),
            amount,
            notify_url: None,
            return_url: None,
        }
    }

    pub fn notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    pub fn return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<(), UnionPayError> {
        if self.trade_no.trim().is_empty() {
            return Err(UnionPayError::ValidationError(
                "trade_no must not be empty".to_string(),
            ));
        }
        if self.amount == 0 {
            return Err(UnionPayError::ValidationError(
                "amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Assemble the signed `bills.getQRCode` parameter set as of `now`.
    pub fn to_signed_params(&self, config: &UnionPayConfig, now: NaiveDateTime) -> Params {
        let text = |s: &str| Value::String(s.to_string());

        let mut params = Params::new();
        params.insert("msgSrc".into(), text(config.msg_src.as_str()));
        params.insert("msgType".into(), text(MSG_TYPE_GET_QR_CODE));
        params.insert(
            "requestTimestamp".into(),
            Value::String(now.format(TIMESTAMP_FORMAT).to_string()),
        );
        params.insert("mid".into(), text(config.mid.as_str()));
        params.insert("tid".into(), text(config.tid.as_str()));
        params.insert("instMid".into(), text(INST_MID));
        params.insert("billNo".into(), text(self.trade_no.as_str()));
        params.insert("merOrderId".into(), text(self.trade_no.as_str()));
        params.insert(
            "billDate".into(),
            Value::String(now.format(BILL_DATE_FORMAT).to_string()),
        );
        params.insert("totalAmount".into(), Value::from(self.amount));

        if let Some(url) = self.notify_url.as_deref().filter(|u| !u.is_empty()) {
            params.insert("notifyUrl".into(), text(url));
        }
        if let Some(url) = self.return_url.as_deref().filter(|u| !u.is_empty()) {
            params.insert("returnUrl".into(), text(url));
        }

        sign_params(&mut params, &config.key);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::verify_signature;
    use chrono::NaiveDate;

    fn config() -> UnionPayConfig {
        UnionPayConfig::new("WWW.TEST.COM", "3194", "898340149000005", "88880001", "test-key")
            .unwrap()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_params_without_urls() {
        let params = PaymentRequest::new("T1001", 100).to_signed_params(&config(), noon());

        assert_eq!(params["msgSrc"], "WWW.TEST.COM");
        assert_eq!(params["msgType"], "bills.getQRCode");
        assert_eq!(params["requestTimestamp"], "2024-03-09 12:05:07");
        assert_eq!(params["billDate"], "2024-03-09");
        assert_eq!(params["mid"], "898340149000005");
        assert_eq!(params["tid"], "88880001");
        assert_eq!(params["instMid"], "QRPAYDEFAULT");
        assert_eq!(params["billNo"], "T1001");
        assert_eq!(params["merOrderId"], "T1001");
        assert_eq!(params["totalAmount"], 100);
        assert!(!params.contains_key("notifyUrl"));
        assert!(!params.contains_key("returnUrl"));

        let sign = params["sign"].as_str().unwrap();
        assert_eq!(sign.len(), 32);
        assert!(verify_signature(&params, "test-key", sign));
    }

    #[test]
    fn test_params_with_urls() {
        let params = PaymentRequest::new("T1002", 1)
            .notify_url("https://shop.example.com/notify")
            .return_url("https://shop.example.com/done")
            .to_signed_params(&config(), noon());

        assert_eq!(params["notifyUrl"], "https://shop.example.com/notify");
        assert_eq!(params["returnUrl"], "https://shop.example.com/done");
    }

    #[test]
    fn test_empty_urls_are_omitted() {
        let params = PaymentRequest::new("T1003", 1)
            .notify_url("")
            .to_signed_params(&config(), noon());
        assert!(!params.contains_key("notifyUrl"));
    }

    #[test]
    fn test_validate() {
        assert!(PaymentRequest::new("T1", 1).validate().is_ok());
        assert!(matches!(
            PaymentRequest::new("  ", 1).validate(),
            Err(UnionPayError::ValidationError(_))
        ));
        assert!(matches!(
            PaymentRequest::new("T1", 0).validate(),
            Err(UnionPayError::ValidationError(_))
        ));
    }
}
