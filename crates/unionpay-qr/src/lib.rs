//! Client for the ChinaUMS (UnionPay) QR bill gateway.
//!
//! Builds and signs `bills.getQRCode` requests, decodes the gateway's
//! JSON or XML replies, and verifies the signed notifications the gateway
//! posts back once a bill changes state.
//!
//! # Quick example
//!
//! ```no_run
//! use unionpay::{UnionPayClient, UnionPayConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), unionpay::UnionPayError> {
//! let client = UnionPayClient::new(UnionPayConfig::from_env()?)?;
//!
//! let qr = client
//!     .pay("T1001", 100, Some("https://shop.example.com/notify"), None)
//!     .await?;
//! println!("scan me: {qr}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod request;
pub mod response;
pub mod security;
pub mod signature;

pub use client::{qr_code_from_response, Notification, UnionPayClient};
pub use config::{ConfigError, UnionPayConfig};
pub use constants::*;
pub use error::UnionPayError;
pub use request::PaymentRequest;
pub use response::{decode_response, GatewayResponse};
pub use signature::{create_signature, verify_signature, Params};
