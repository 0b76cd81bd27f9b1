//! Facade configuration.
//!
//! Provides [`FacadeConfig`], covering where the storage client connects and
//! how long writes are polled for visibility. Values are loaded from
//! environment variables via [`FacadeConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::wait::WaitConfig;

/// Region that must not be sent as an explicit bucket location constraint.
pub const US_EAST_1: &str = "us-east-1";

/// Storage client and facade configuration.
///
/// # Examples
///
/// ```
/// use s3facade_core::FacadeConfig;
///
/// let config = FacadeConfig::default();
/// assert!(config.region.is_none());
/// assert!(config.endpoint_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct FacadeConfig {
    /// Region override. When unset the SDK default chain (environment,
    /// profile) decides.
    #[builder(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (e.g. a local S3-compatible server).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Whether to address buckets in the path instead of the host name.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Static access key ID; the default credential chain is used when unset.
    #[builder(default)]
    pub access_key_id: Option<String>,

    /// Static secret access key, paired with `access_key_id`.
    #[builder(default)]
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Delay between existence checks, in milliseconds.
    #[builder(default = 5_000)]
    pub wait_delay_ms: u64,

    /// Maximum number of existence checks after a write.
    #[builder(default = 20)]
    pub wait_max_attempts: u32,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
            wait_delay_ms: 5_000,
            wait_max_attempts: 20,
            log_level: String::from("info"),
        }
    }
}

impl FacadeConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION` / `DEFAULT_REGION` | *(SDK default chain)* |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `false` |
    /// | `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `S3_WAIT_DELAY_MS` | `5000` |
    /// | `S3_WAIT_MAX_ATTEMPTS` | `20` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("AWS_REGION").or_else(|_| std::env::var("DEFAULT_REGION")) {
            config.region = Some(v);
        }
        if let Ok(v) = std::env::var("S3_ENDPOINT_URL") {
            config.endpoint_url = Some(v);
        }
        if let Ok(v) = std::env::var("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("AWS_ACCESS_KEY_ID") {
            config.access_key_id = Some(v);
        }
        if let Ok(v) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            config.secret_access_key = Some(v);
        }
        if let Ok(v) = std::env::var("S3_WAIT_DELAY_MS") {
            if let Ok(n) = v.parse::<u64>() {
                config.wait_delay_ms = n;
            }
        }
        if let Ok(v) = std::env::var("S3_WAIT_MAX_ATTEMPTS") {
            if let Ok(n) = v.parse::<u32>() {
                config.wait_max_attempts = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The existence-poll parameters described by this configuration.
    #[must_use]
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(self.wait_delay_ms),
            self.wait_max_attempts,
        )
    }

}

/// The location constraint to send when creating a bucket in `region`.
///
/// `us-east-1` is the implicit default and is rejected as an explicit
/// constraint, so it maps to `None`.
#[must_use]
pub fn location_constraint(region: Option<&str>) -> Option<&str> {
    region.filter(|r| !r.is_empty() && *r != US_EAST_1)
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
