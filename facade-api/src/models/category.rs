use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported type: {0}")]
pub struct UnsupportedCategory(pub String);

/// Role a device endpoint plays inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceCategory {
    /// Dimmable light level (writable)
    Light,
    /// Occupancy sensor
    Occupancy,
    /// Facade / shading state (writable)
    #[serde(rename = "Façade State")]
    FacadeState,
    /// Glare sensor
    Glare,
    /// Workplane illuminance sensor
    Illuminance,
    /// Solar radiation sensor
    #[serde(rename = "Solar Radiation")]
    SolarRadiation,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 6] = [
        DeviceCategory::Light,
        DeviceCategory::Occupancy,
        DeviceCategory::FacadeState,
        DeviceCategory::Glare,
        DeviceCategory::Illuminance,
        DeviceCategory::SolarRadiation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCategory::Light => "Light",
            DeviceCategory::Occupancy => "Occupancy",
            DeviceCategory::FacadeState => "Façade State",
            DeviceCategory::Glare => "Glare",
            DeviceCategory::Illuminance => "Illuminance",
            DeviceCategory::SolarRadiation => "Solar Radiation",
        }
    }

    /// Whether the controller writes to endpoints of this category.
    pub fn is_writable(&self) -> bool {
        matches!(self, DeviceCategory::Light | DeviceCategory::FacadeState)
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCategory {
    type Err = UnsupportedCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnsupportedCategory(s.to_string()))
    }
}

/// Outputs a control decision can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ControlOutput {
    Light,
    #[serde(rename = "Façade State")]
    FacadeState,
}

impl From<ControlOutput> for DeviceCategory {
    fn from(output: ControlOutput) -> Self {
        match output {
            ControlOutput::Light => DeviceCategory::Light,
            ControlOutput::FacadeState => DeviceCategory::FacadeState,
        }
    }
}

impl fmt::Display for ControlOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DeviceCategory::from(*self).fmt(f)
    }
}
