use std::env;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::constants::DEFAULT_BASE_URL;

/// Credentials issued by the gateway for one merchant terminal.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UnionPayConfig {
    /// Message source id (`msgSrc`)
    #[serde(default)]
    pub msg_src: String,
    /// Message source sub-id
    #[serde(default)]
    pub msg_src_id: String,
    /// Merchant id (`mid`)
    #[serde(default)]
    pub mid: String,
    /// Terminal id (`tid`)
    #[serde(default)]
    pub tid: String,
    /// Shared signing key
    #[serde(default)]
    pub key: String,
    /// Gateway host, overridable for sandbox environments
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl std::fmt::Debug for UnionPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionPayConfig")
            .field("msg_src", &self.msg_src)
            .field("msg_src_id", &self.msg_src_id)
            .field("mid", &self.mid)
            .field("tid", &self.tid)
            .field("key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UnionPayConfig {
    pub fn new(
        msg_src: impl Into<String>,
        msg_src_id: impl Into<String>,
        mid: impl Into<String>,
        tid: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            msg_src: msg_src.into(),
            msg_src_id: msg_src_id.into(),
            mid: mid.into(),
            tid: tid.into(),
            key: key.into(),
            base_url: default_base_url(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Point the client at another gateway host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        self.base_url = base_url.into();
        self.validate()?;
        Ok(self)
    }

    /// Load from a configuration tree holding a `payment.union_pay` section.
    pub fn from_value(root: &Value) -> Result<Self, ConfigError> {
        let section = root
            .get("payment")
            .and_then(|p| p.get("union_pay"))
            .filter(|s| s.is_object())
            .ok_or(ConfigError::MissingSection("payment.union_pay"))?;

        let config: Self = serde_json::from_value(section.clone())
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `UNIONPAY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            env::var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::MissingRequired(name))
        };

        let config = Self {
            msg_src: required("UNIONPAY_MSG_SRC")?,
            msg_src_id: required("UNIONPAY_MSG_SRC_ID")?,
            mid: required("UNIONPAY_MID")?,
            tid: required("UNIONPAY_TID")?,
            key: required("UNIONPAY_KEY")?,
            base_url: env::var("UNIONPAY_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_base_url),
        };
        config.validate()?;

        if config.key.len() < 16 {
            tracing::warn!(
                "UNIONPAY_KEY is only {} bytes, check it was copied in full",
                config.key.len()
            );
        }

        Ok(config)
    }

    /// Check that every credential is present and the base URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("msg_src", &self.msg_src),
            ("msg_src_id", &self.msg_src_id),
            ("mid", &self.mid),
            ("tid", &self.tid),
            ("key", &self.key),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::MissingRequired(*name));
        }

        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;
        Ok(())
    }

    /// Full URL of the bill API.
    pub fn api_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            crate::constants::API_PATH
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing payment parameters: section `{0}` not found")]
    MissingSection(&'static str),

    #[error("missing payment parameters: `{0}`")]
    MissingRequired(&'static str),

    #[error("missing payment parameters: {0}")]
    Malformed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
