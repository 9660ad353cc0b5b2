use billpilot_types::CATEGORY_METADATA_KEY;
use serde::{Deserialize, Serialize};

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Metadata key holding a customer's category tag
    #[serde(default = "default_category_key")]
    pub category_key: String,
}

fn default_category_key() -> String {
    CATEGORY_METADATA_KEY.to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            category_key: default_category_key(),
        }
    }
}

impl BillingConfig {
    pub fn with_category_key(mut self, key: impl Into<String>) -> Self {
        self.category_key = key.into();
        self
    }
}
