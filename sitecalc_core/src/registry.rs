//! # Calculation-Kind Registry
//!
//! A static table of every supported calculation kind. Each kind carries a
//! stable integer code that appears in persisted project files, so codes are
//! sparse and never change even when display names do. Adding a kind means
//! adding a row; removing one is not allowed.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed enumeration of supported calculation kinds.
///
/// `None` is the uninitialised sentinel used by a freshly created project
/// before a discipline has been chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalculationKind {
    #[default]
    None,
    SoilEmbankment,
    HydraulicTruckCrane,
    CrawlerCrane,
}

impl CalculationKind {
    /// The stable persisted code for this kind. Codes are sparse on purpose;
    /// they mirror the codes already present in saved files.
    pub const fn code(self) -> u32 {
        match self {
            CalculationKind::None => 0,
            CalculationKind::SoilEmbankment => 6,
            CalculationKind::HydraulicTruckCrane => 7,
            CalculationKind::CrawlerCrane => 100,
        }
    }

    /// Resolve a persisted code back to a kind.
    pub fn from_code(code: u32) -> Option<Self> {
        CODE_INDEX.get(&code).copied()
    }

    /// Human-readable name for the UI and report titles.
    pub fn display_name(self) -> &'static str {
        match self {
            CalculationKind::None => "Uninitialised",
            CalculationKind::SoilEmbankment => "Foundation Excavation Slope Verification",
            CalculationKind::HydraulicTruckCrane => "Hydraulic Truck Crane Lifting Verification",
            CalculationKind::CrawlerCrane => "Crawler Crane Lifting Verification",
        }
    }
}

/// One row of the registry table.
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    pub kind: CalculationKind,
    pub code: u32,
    pub display_name: &'static str,
}

/// All registered kinds, in registration order.
pub const REGISTRY: [CalculationKind; 4] = [
    CalculationKind::None,
    CalculationKind::SoilEmbankment,
    CalculationKind::HydraulicTruckCrane,
    CalculationKind::CrawlerCrane,
];

static CODE_INDEX: Lazy<HashMap<u32, CalculationKind>> =
    Lazy::new(|| REGISTRY.iter().map(|k| (k.code(), *k)).collect());

/// List every registered kind with its code and display name.
pub fn registered_kinds() -> Vec<KindInfo> {
    REGISTRY
        .iter()
        .map(|k| KindInfo {
            kind: *k,
            code: k.code(),
            display_name: k.display_name(),
        })
        .collect()
}

/// Display name helper for UI code.
pub fn name_of(kind: CalculationKind) -> &'static str {
    kind.display_name()
}

// The kind is persisted as its stable integer code, not as a name, so that
// renaming a variant never breaks saved files.
impl Serialize for CalculationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.code())
    }
}

impl<'de> Deserialize<'de> for CalculationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u32::deserialize(deserializer)?;
        CalculationKind::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown calculation kind code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(CalculationKind::None.code(), 0);
        assert_eq!(CalculationKind::SoilEmbankment.code(), 6);
        assert_eq!(CalculationKind::HydraulicTruckCrane.code(), 7);
        assert_eq!(CalculationKind::CrawlerCrane.code(), 100);
    }

    #[test]
    fn test_from_code_roundtrip() {
        for info in registered_kinds() {
            assert_eq!(CalculationKind::from_code(info.code), Some(info.kind));
        }
        assert_eq!(CalculationKind::from_code(42), None);
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&CalculationKind::HydraulicTruckCrane).unwrap();
        assert_eq!(json, "7");

        let kind: CalculationKind = serde_json::from_str("100").unwrap();
        assert_eq!(kind, CalculationKind::CrawlerCrane);

        assert!(serde_json::from_str::<CalculationKind>("3").is_err());
    }

    #[test]
    fn test_display_names() {
        assert!(name_of(CalculationKind::SoilEmbankment).contains("Excavation"));
        assert!(name_of(CalculationKind::HydraulicTruckCrane).contains("Truck Crane"));
    }
}
