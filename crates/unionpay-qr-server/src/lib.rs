//! HTTP host for the UnionPay QR client.
//!
//! - [`routes`] — `/pay`, `/notify`, `/bills/{bill_no}`, `/health`
//! - [`state`] — shared client and the last status seen per bill
//! - [`config`] — environment-driven server configuration

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use state::AppState;
