use std::{fs, path::Path};

use billpilot_core::{BillingConfig, SandboxConfig};
use billpilot_types::MANIFEST_FILE_NAME;
use serde::{Deserialize, Serialize};

/// Billpilot manifest file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Orchestrator settings
    #[serde(default)]
    pub billing: BillingConfig,

    /// Hosted processor connection
    #[serde(default)]
    pub stripe: StripeSection,

    /// Plans and coupons served by `--sandbox`
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeSection {
    /// Secret key; prefer the STRIPE_SECRET_KEY environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API host override, e.g. a local stripe-mock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadManifestError {
    #[error("{} not found at {}", MANIFEST_FILE_NAME, .0.display())]
    FileNotFound(std::path::PathBuf),
    #[error("Failed to read {}: {}", .0.display(), .1)]
    ReadError(std::path::PathBuf, std::io::Error),
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    ParseError(std::path::PathBuf, serde_yml::Error),
}

impl Manifest {
    /// Load manifest from the specified file path
    pub fn load(manifest_file_path: &Path) -> Result<Self, LoadManifestError> {
        if !manifest_file_path.exists() {
            return Err(LoadManifestError::FileNotFound(
                manifest_file_path.to_path_buf(),
            ));
        }

        let content = fs::read_to_string(manifest_file_path)
            .map_err(|e| LoadManifestError::ReadError(manifest_file_path.to_path_buf(), e))?;

        serde_yml::from_str(&content)
            .map_err(|e| LoadManifestError::ParseError(manifest_file_path.to_path_buf(), e))
    }
}
