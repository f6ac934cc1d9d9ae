use std::time::Duration;

/// Production gateway host.
pub const DEFAULT_BASE_URL: &str = "https://qr.chinaums.com";

/// Path of the bill API, appended to the base URL.
pub const API_PATH: &str = "/netpay-route-server/api/";

/// Message type for requesting a bill QR code.
pub const MSG_TYPE_GET_QR_CODE: &str = "bills.getQRCode";

/// Institution merchant id used for default QR bills.
pub const INST_MID: &str = "QRPAYDEFAULT";

/// `errCode` value the gateway uses for an accepted request.
pub const SUCCESS_CODE: &str = "SUCCESS";

/// Body the gateway expects in reply to a notification it delivered.
pub const NOTIFY_ACK: &str = "SUCCESS";

/// Name of the signature field in requests and notifications.
pub const SIGN_FIELD: &str = "sign";

/// Per-request timeout for calls to the gateway.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// `requestTimestamp` layout.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `billDate` layout.
pub const BILL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Message surfaced when the gateway reply carries no usable `errCode`.
pub const GATEWAY_UNAVAILABLE: &str = "payment request failed, try again later";
