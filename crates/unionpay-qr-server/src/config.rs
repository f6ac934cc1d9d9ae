use std::env;

use unionpay::{ConfigError, UnionPayConfig};

const DEFAULT_PORT: u16 = 4030;
const DEFAULT_RATE_LIMIT_RPM: u64 = 60;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Gateway credentials
    pub unionpay: UnionPayConfig,
    /// Server port
    pub port: u16,
    /// Rate limit requests per minute, per client IP
    pub rate_limit_rpm: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let unionpay = UnionPayConfig::from_env()?;

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|rpm| *rpm > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        if unionpay.base_url != unionpay::DEFAULT_BASE_URL {
            tracing::warn!(base_url = %unionpay.base_url, "using non-production gateway host");
        }

        Ok(Self {
            unionpay,
            port,
            rate_limit_rpm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults_and_overrides() {
        for (name, value) in [
            ("UNIONPAY_MSG_SRC", "WWW.TEST.COM"),
            ("UNIONPAY_MSG_SRC_ID", "3194"),
            ("UNIONPAY_MID", "898340149000005"),
            ("UNIONPAY_TID", "88880001"),
            ("UNIONPAY_KEY", "test-signing-key-0123456789"),
        ] {
            env::set_var(name, value);
        }
        env::remove_var("UNIONPAY_BASE_URL");
        env::remove_var("PORT");
        env::remove_var("RATE_LIMIT_RPM");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.rate_limit_rpm, DEFAULT_RATE_LIMIT_RPM);
        assert_eq!(config.unionpay.mid, "898340149000005");

        env::set_var("PORT", "8080");
        env::set_var("RATE_LIMIT_RPM", "600");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_rpm, 600);

        // Unparseable or zero values fall back to the defaults.
        env::set_var("PORT", "http");
        env::set_var("RATE_LIMIT_RPM", "0");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.rate_limit_rpm, DEFAULT_RATE_LIMIT_RPM);

        env::remove_var("UNIONPAY_KEY");
        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::MissingRequired("UNIONPAY_KEY"))
        ));

        for name in [
            "UNIONPAY_MSG_SRC",
            "UNIONPAY_MSG_SRC_ID",
            "UNIONPAY_MID",
            "UNIONPAY_TID",
            "PORT",
            "RATE_LIMIT_RPM",
        ] {
            env::remove_var(name);
        }
    }
}
