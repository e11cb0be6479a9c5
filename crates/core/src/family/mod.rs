//! Hardware family resolution.
//!
//! The family governs which orchestration variant applies: resolution
//! overrides, two-segment pipeline handling, and the expected alert
//! sequence. Resolution happens once per orchestrator and is immutable
//! afterwards.

use serde::{Deserialize, Serialize};

use crate::cdm::DeviceIdentity;

/// The behavior variant selected for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Enterprise,
    DesignJet,
    HomePro,
    /// HomePro devices whose product name carries the beam marker.
    Beam,
    /// Fallback for unrecognized families.
    Generic,
}

impl Family {
    /// Resolve the family from device-reported family and product names.
    ///
    /// Deterministic for a given pair; unrecognized families map to
    /// [`Family::Generic`] rather than failing.
    pub fn resolve(family_name: &str, product_name: &str) -> Family {
        match family_name {
            "enterprise" => Family::Enterprise,
            "designjet" => Family::DesignJet,
            "homepro" => {
                if product_name.to_ascii_lowercase().contains("beam") {
                    Family::Beam
                } else {
                    Family::HomePro
                }
            }
            _ => Family::Generic,
        }
    }

    /// Resolve from a one-time identity fetch.
    pub fn from_identity(identity: &DeviceIdentity) -> Family {
        Family::resolve(&identity.family_name, &identity.product_name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Enterprise => "enterprise",
            Family::DesignJet => "designjet",
            Family::HomePro => "homepro",
            Family::Beam => "beam",
            Family::Generic => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_families() {
        assert_eq!(Family::resolve("enterprise", "LaserJet X"), Family::Enterprise);
        assert_eq!(Family::resolve("designjet", "DesignJet T"), Family::DesignJet);
        assert_eq!(Family::resolve("homepro", "OfficeJet 9000"), Family::HomePro);
    }

    #[test]
    fn test_resolve_beam_by_product_substring() {
        assert_eq!(Family::resolve("homepro", "HomePro Beam 500"), Family::Beam);
        assert_eq!(Family::resolve("homepro", "BEAM-Lite"), Family::Beam);
        // Beam marker only applies within homepro.
        assert_eq!(Family::resolve("enterprise", "Beam 500"), Family::Enterprise);
    }

    #[test]
    fn test_resolve_unknown_maps_to_generic() {
        assert_eq!(Family::resolve("ares", "Prototype"), Family::Generic);
        assert_eq!(Family::resolve("", ""), Family::Generic);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(Family::resolve("homepro", "Beam"), Family::Beam);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Family::DesignJet).unwrap(), "\"designjet\"");
        let family: Family = serde_json::from_str("\"homepro\"").unwrap();
        assert_eq!(family, Family::HomePro);
    }
}
