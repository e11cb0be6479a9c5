use serde::{Deserialize, Serialize};

use crate::family::Family;
use crate::orchestrator::OrchestratorConfig;

/// Root harness configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Pin the family instead of fetching the device identity.
    #[serde(default)]
    pub family: Option<FamilyOverride>,
}

impl Config {
    /// Family resolved from the override, if one is pinned.
    pub fn resolved_family(&self) -> Option<Family> {
        self.family
            .as_ref()
            .map(|f| Family::resolve(&f.family_name, &f.product_name))
    }
}

/// Device connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Base URL of the device CDM interface (e.g. "http://10.0.0.12").
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Family override for harnesses that already know the hardware.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FamilyOverride {
    pub family_name: String,
    #[serde(default)]
    pub product_name: String,
}
