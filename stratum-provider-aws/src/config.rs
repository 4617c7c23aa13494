//! Provider configuration
//!
//! Built from the attributes of the provider block:
//!
//! ```text
//! provider aws {
//!   region  = aws.Region.eu_west_1
//!   profile = "deploy"
//!   default_timeout = "30m"
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use stratum_core::provider::{ErrorKind, ProviderError, ProviderResult};
use stratum_core::resource::Value;
use stratum_core::timeouts::parse_duration;

/// Settings shared by every resource of the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// AWS region (plain form, e.g. "eu-west-1")
    pub region: String,
    /// Named profile from the shared config files
    pub profile: Option<String>,
    /// Overrides every resource type's default timeouts when set
    pub default_timeout: Option<Duration>,
}

impl ProviderConfig {
    pub fn new(region: &str) -> Self {
        Self {
            region: normalize_region(region),
            profile: None,
            default_timeout: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Build from provider block attributes; `region` is required
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let region = attributes
            .get("region")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("provider attribute 'region' is required"))?;

        let mut config = Self::new(region);

        if let Some(profile) = attributes.get("profile") {
            let profile = profile
                .as_str()
                .ok_or_else(|| invalid("provider attribute 'profile' must be a string"))?;
            config = config.with_profile(profile);
        }

        if let Some(timeout) = attributes.get("default_timeout") {
            let raw = timeout
                .as_str()
                .ok_or_else(|| invalid("provider attribute 'default_timeout' must be a string"))?;
            config = config.with_default_timeout(parse_duration(raw)?);
        }

        Ok(config)
    }

    /// Load the SDK configuration (credentials chain, retry defaults)
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        loader.load().await
    }
}

fn invalid(message: &str) -> ProviderError {
    ProviderError::new(message).with_kind(ErrorKind::InvalidConfig)
}

/// Normalize region value (e.g., "aws.Region.ap_northeast_1" -> "ap-northeast-1")
pub fn normalize_region(s: &str) -> String {
    let region_part = if s.contains('.') {
        s.split('.').next_back().unwrap_or(s)
    } else {
        s
    };
    region_part.replace('_', "-")
}
