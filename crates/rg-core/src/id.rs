//! Component ID type naming a generated variable

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid component IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("ID cannot be empty")]
    Empty,

    #[error("first character of ID '{0}' must be a letter or underscore")]
    InvalidStart(String),

    #[error("ID '{id}' contains invalid character '{ch}' (only letters, digits and underscores are allowed)")]
    InvalidChar { id: String, ch: char },

    #[error("ID '{0}' is reserved, please choose another name")]
    Reserved(String),
}

/// Names that collide with C++ keywords or symbols of the generated program
const RESERVED_IDS: &[&str] = &[
    "App", "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue",
    "default", "delay", "delayMicroseconds", "delete", "do", "double", "else", "enum", "esphome",
    "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "int16_t",
    "int32_t", "int64_t", "int8_t", "log", "long", "loop", "micros", "millis", "namespace", "new",
    "nullptr", "operator", "pinMode", "private", "protected", "public", "ratgdo", "register",
    "return", "setup", "short", "signed", "sizeof", "static", "std", "struct", "switch",
    "template", "this", "throw", "true", "try", "typedef", "uint16_t", "uint32_t", "uint64_t",
    "uint8_t", "union", "unsigned", "using", "virtual", "void", "volatile", "while",
];

/// Identifier of a generated object (e.g., "garage_motion")
///
/// IDs become C++ variable names in the generated program, so they follow C
/// identifier rules and may not shadow keywords or runtime symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId(String);

impl ComponentId {
    /// Create a new ComponentId, validating the name
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();

        let mut chars = id.chars();
        let first = chars.next().ok_or(IdError::Empty)?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(IdError::InvalidStart(id));
        }
        if let Some(ch) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(IdError::InvalidChar { id, ch });
        }
        if RESERVED_IDS.contains(&id.as_str()) {
            return Err(IdError::Reserved(id));
        }

        Ok(Self(id))
    }

    /// Derive an ID from a free-form name, prefixed so it cannot start with a digit
    ///
    /// `"Garage Motion!"` with prefix `"ratgdo_binary_sensor"` becomes
    /// `ratgdo_binary_sensor_garage_motion`.
    pub fn from_name(prefix: &str, name: &str) -> Result<Self, IdError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('_') {
                slug.push('_');
            }
        }
        let slug = slug.trim_matches('_');

        if slug.is_empty() {
            Self::new(prefix)
        } else {
            Self::new(format!("{}_{}", prefix, slug))
        }
    }

    /// Append a numeric suffix, used to disambiguate generated IDs
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}_{}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ComponentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ComponentId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> String {
        id.0
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert_eq!(ComponentId::new("sensor1").unwrap().as_str(), "sensor1");
        assert!(ComponentId::new("_private").is_ok());
        assert!(ComponentId::new("Door_1").is_ok());
    }

    #[test]
    fn test_empty() {
        assert_eq!(ComponentId::new("").unwrap_err(), IdError::Empty);
    }

    #[test]
    fn test_invalid_start() {
        assert_eq!(
            "1door".parse::<ComponentId>().unwrap_err(),
            IdError::InvalidStart("1door".to_string())
        );
    }

    #[test]
    fn test_invalid_chars() {
        assert_eq!(
            "door-1".parse::<ComponentId>().unwrap_err(),
            IdError::InvalidChar {
                id: "door-1".to_string(),
                ch: '-'
            }
        );
        assert!(matches!(
            "door.1".parse::<ComponentId>(),
            Err(IdError::InvalidChar { ch: '.', .. })
        ));
    }

    #[test]
    fn test_reserved() {
        assert_eq!(
            ComponentId::new("App").unwrap_err(),
            IdError::Reserved("App".to_string())
        );
        assert!(ComponentId::new("class").is_err());
        // Reserved names are case-sensitive, like C++
        assert!(ComponentId::new("Class").is_ok());
    }

    #[test]
    fn test_from_name() {
        let id = ComponentId::from_name("ratgdo_binary_sensor", "Garage Motion!").unwrap();
        assert_eq!(id.as_str(), "ratgdo_binary_sensor_garage_motion");

        let id = ComponentId::from_name("ratgdo_binary_sensor", "  --  ").unwrap();
        assert_eq!(id.as_str(), "ratgdo_binary_sensor");
    }

    #[test]
    fn test_with_suffix() {
        let id = ComponentId::new("motion").unwrap();
        assert_eq!(id.with_suffix(2).as_str(), "motion_2");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = ComponentId::new("door1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"door1\"");

        let parsed: ComponentId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<ComponentId>("\"9lives\"").is_err());
    }
}
