//! Argument expressions of generated calls

use rg_core::ComponentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A C++ expression passed as a call argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expression {
    /// Reference to a declared variable
    Id(ComponentId),
    /// String literal
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Emitted verbatim, e.g. an enum constant
    Raw(String),
}

impl Expression {
    pub fn raw(code: impl Into<String>) -> Self {
        Expression::Raw(code.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expression::Str(s.into())
    }

    /// The variable this expression refers to, if any
    pub fn referenced_id(&self) -> Option<&ComponentId> {
        match self {
            Expression::Id(id) => Some(id),
            _ => None,
        }
    }
}

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Expression::Bool(b)
    }
}

impl From<ComponentId> for Expression {
    fn from(id: ComponentId) -> Self {
        Expression::Id(id)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Id(id) => write!(f, "{}", id),
            Expression::Str(s) => write_cpp_string(f, s),
            Expression::Bool(b) => write!(f, "{}", b),
            Expression::Int(i) => write!(f, "{}", i),
            Expression::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}f", x),
            Expression::Float(x) => write!(f, "{}f", x),
            Expression::Raw(code) => f.write_str(code),
        }
    }
}

fn write_cpp_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_ascii_control() => write!(f, "\\{:03o}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_literals() {
        assert_eq!(Expression::Bool(true).to_string(), "true");
        assert_eq!(Expression::Int(-3).to_string(), "-3");
        assert_eq!(Expression::Float(1.0).to_string(), "1.0f");
        assert_eq!(Expression::Float(0.25).to_string(), "0.25f");
        assert_eq!(
            Expression::raw("ratgdo::SensorType::RATGDO_SENSOR_MOTION").to_string(),
            "ratgdo::SensorType::RATGDO_SENSOR_MOTION"
        );
    }

    #[test]
    fn test_render_string_escapes() {
        assert_eq!(Expression::string("Garage").to_string(), "\"Garage\"");
        assert_eq!(
            Expression::string("say \"hi\"\n").to_string(),
            "\"say \\\"hi\\\"\\n\""
        );
        assert_eq!(Expression::string("a\\b").to_string(), "\"a\\\\b\"");
    }

    #[test]
    fn test_referenced_id() {
        let id = ComponentId::new("door1").unwrap();
        assert_eq!(Expression::Id(id.clone()).referenced_id(), Some(&id));
        assert_eq!(Expression::Bool(false).referenced_id(), None);
    }
}
