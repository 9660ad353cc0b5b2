use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
pub const API_KEY_ENV: &str = "STRIPE_SECRET_KEY";
pub const API_BASE_ENV: &str = "STRIPE_API_BASE";

#[derive(Debug, thiserror::Error)]
pub enum StripeConfigError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),
    #[error("API key is empty")]
    EmptyApiKey,
}

/// Connection settings for the hosted processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeConfig {
    pub api_key: String,
    /// Override of the API host, e.g. a local stripe-mock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Read `STRIPE_SECRET_KEY` and the optional `STRIPE_API_BASE`
    pub fn from_env() -> Result<Self, StripeConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| StripeConfigError::MissingApiKey(API_KEY_ENV))?;
        let mut config = Self::new(api_key);
        if let Ok(api_base) = std::env::var(API_BASE_ENV) {
            config.api_base = Some(api_base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StripeConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(StripeConfigError::EmptyApiKey);
        }
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Whether the key belongs to a test-mode account
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_") || self.api_key.starts_with("rk_test_")
    }
}
