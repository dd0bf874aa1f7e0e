//! Canonical resource categories.
//!
//! The category set is closed and supplied by the upstream class-discovery
//! subsystem. Membership is decided by type hierarchy, never by looking at the
//! characters of an identifier: a `PlateCarrier` is a [`ResourceCategory::Carrier`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical classification of a hardware or labware type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ResourceCategory {
    // labware
    Plate,
    TipRack,
    Reservoir,
    Tube,
    TubeRack,
    Carrier,
    Deck,
    Lid,
    // machines
    LiquidHandler,
    PlateReader,
    HeaterShaker,
    Shaker,
    TemperatureController,
    Thermocycler,
    Centrifuge,
    Incubator,
    Sealer,
    Peeler,
    Scale,
    Pump,
    PowderDispenser,
    Arm,
}

impl ResourceCategory {
    /// Every category, labware first.
    pub const ALL: [ResourceCategory; 22] = [
        Self::Plate,
        Self::TipRack,
        Self::Reservoir,
        Self::Tube,
        Self::TubeRack,
        Self::Carrier,
        Self::Deck,
        Self::Lid,
        Self::LiquidHandler,
        Self::PlateReader,
        Self::HeaterShaker,
        Self::Shaker,
        Self::TemperatureController,
        Self::Thermocycler,
        Self::Centrifuge,
        Self::Incubator,
        Self::Sealer,
        Self::Peeler,
        Self::Scale,
        Self::Pump,
        Self::PowderDispenser,
        Self::Arm,
    ];

    /// Stable snake_case name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plate => "plate",
            Self::TipRack => "tip_rack",
            Self::Reservoir => "reservoir",
            Self::Tube => "tube",
            Self::TubeRack => "tube_rack",
            Self::Carrier => "carrier",
            Self::Deck => "deck",
            Self::Lid => "lid",
            Self::LiquidHandler => "liquid_handler",
            Self::PlateReader => "plate_reader",
            Self::HeaterShaker => "heater_shaker",
            Self::Shaker => "shaker",
            Self::TemperatureController => "temperature_controller",
            Self::Thermocycler => "thermocycler",
            Self::Centrifuge => "centrifuge",
            Self::Incubator => "incubator",
            Self::Sealer => "sealer",
            Self::Peeler => "peeler",
            Self::Scale => "scale",
            Self::Pump => "pump",
            Self::PowderDispenser => "powder_dispenser",
            Self::Arm => "arm",
        }
    }

    /// Whether this category is an instrument rather than labware.
    pub fn is_machine(&self) -> bool {
        !matches!(
            self,
            Self::Plate
                | Self::TipRack
                | Self::Reservoir
                | Self::Tube
                | Self::TubeRack
                | Self::Carrier
                | Self::Deck
                | Self::Lid
        )
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not the canonical name of a category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for ResourceCategory {
    type Err = UnknownCategory;

    /// Parses the canonical snake_case name only. This is a decoding step for
    /// documents and command lines, not a classifier for type identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
