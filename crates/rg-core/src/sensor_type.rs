//! Binary sensor roles recognized by the ratgdo integration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a ratgdo binary sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SensorType {
    /// Motion detected by the opener's wall panel
    Motion,
    /// Safety-beam obstruction
    Obstruction,
}

/// Label-to-role lookup table, in declaration order
pub static SENSOR_TYPES: &[(&str, SensorType)] = &[
    ("motion", SensorType::Motion),
    ("obstruction", SensorType::Obstruction),
];

impl SensorType {
    /// Resolve a config label to a sensor type
    ///
    /// The label is lower-cased before lookup, so `"Obstruction"` resolves.
    pub fn resolve(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        SENSOR_TYPES
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, ty)| *ty)
    }

    /// The lower-case config label
    pub fn label(&self) -> &'static str {
        match self {
            SensorType::Motion => "motion",
            SensorType::Obstruction => "obstruction",
        }
    }

    /// The generated C++ enum constant
    pub fn cpp_constant(&self) -> &'static str {
        match self {
            SensorType::Motion => "ratgdo::SensorType::RATGDO_SENSOR_MOTION",
            SensorType::Obstruction => "ratgdo::SensorType::RATGDO_SENSOR_OBSTRUCTION",
        }
    }

    /// All labels, for error messages
    pub fn labels() -> Vec<&'static str> {
        SENSOR_TYPES.iter().map(|(name, _)| *name).collect()
    }
}

impl FromStr for SensorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| {
            format!(
                "unknown value '{}', valid options are {}",
                s,
                Self::labels().join(", ")
            )
        })
    }
}

impl TryFrom<String> for SensorType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SensorType> for &'static str {
    fn from(ty: SensorType) -> &'static str {
        ty.label()
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
