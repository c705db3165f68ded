//! Generic binary-sensor schema
//!
//! Fields every binary sensor accepts regardless of platform, and the
//! registration actions that hand a sensor to the application.

use regex::Regex;
use rg_codegen::{Action, Expression};
use rg_core::ComponentId;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{ValidationError, ValidationResult};
use crate::registry::IdRegistry;
use crate::schema::FieldReader;

pub const CONF_ID: &str = "id";
pub const CONF_NAME: &str = "name";
pub const CONF_ICON: &str = "icon";
pub const CONF_INTERNAL: &str = "internal";
pub const CONF_DISABLED_BY_DEFAULT: &str = "disabled_by_default";
pub const CONF_DEVICE_CLASS: &str = "device_class";
pub const CONF_ENTITY_CATEGORY: &str = "entity_category";
pub const CONF_PUBLISH_INITIAL_STATE: &str = "publish_initial_state";

/// Binary sensor device classes understood by Home Assistant
pub static DEVICE_CLASSES: &[&str] = &[
    "battery",
    "battery_charging",
    "carbon_monoxide",
    "cold",
    "connectivity",
    "door",
    "garage_door",
    "gas",
    "heat",
    "light",
    "lock",
    "moisture",
    "motion",
    "moving",
    "occupancy",
    "opening",
    "plug",
    "power",
    "presence",
    "problem",
    "running",
    "safety",
    "smoke",
    "sound",
    "tamper",
    "update",
    "vibration",
    "window",
];

/// Entity category shown in the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

impl EntityCategory {
    pub fn cpp_constant(&self) -> &'static str {
        match self {
            EntityCategory::Config => "ENTITY_CATEGORY_CONFIG",
            EntityCategory::Diagnostic => "ENTITY_CATEGORY_DIAGNOSTIC",
        }
    }
}

fn icon_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w\-]+:[\w\-]+$").expect("icon pattern"))
}

/// Validated generic binary-sensor fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySensorSchema {
    pub id: ComponentId,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub internal: bool,
    pub disabled_by_default: bool,
    pub device_class: Option<String>,
    pub entity_category: Option<EntityCategory>,
    pub publish_initial_state: bool,
}

impl BinarySensorSchema {
    /// Validate the generic fields of an entry
    ///
    /// Without an explicit `id`, one is derived from `name` (or from
    /// `id_hint` when the sensor is unnamed) with `id_prefix`. The ID is
    /// not declared in `ids`; the caller does that once the whole entry
    /// has validated.
    pub fn validate(
        reader: &mut FieldReader<'_>,
        ids: &IdRegistry,
        id_prefix: &str,
        id_hint: &str,
    ) -> ValidationResult<Self> {
        let name = reader.optional_string(CONF_NAME)?;

        let id = match reader.optional_id(CONF_ID)? {
            Some(id) => id,
            None => ids.generate_id(id_prefix, name.as_deref().unwrap_or(id_hint))?,
        };

        let icon = reader.optional_string(CONF_ICON)?;
        if let Some(icon) = &icon {
            if !icon_pattern().is_match(icon) {
                return Err(reader.invalid(
                    CONF_ICON,
                    format!("icons should be formatted like 'mdi:garage', got '{}'", icon),
                ));
            }
        }

        let device_class = reader.optional_lower(CONF_DEVICE_CLASS)?;
        if let Some(class) = &device_class {
            if !DEVICE_CLASSES.contains(&class.as_str()) {
                return Err(ValidationError::UnknownValue {
                    path: reader.path().to_string(),
                    field: CONF_DEVICE_CLASS.to_string(),
                    value: class.clone(),
                    allowed: DEVICE_CLASSES.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        Ok(Self {
            id,
            name,
            icon,
            internal: reader.optional_bool(CONF_INTERNAL, false)?,
            disabled_by_default: reader.optional_bool(CONF_DISABLED_BY_DEFAULT, false)?,
            device_class,
            entity_category: reader.optional(CONF_ENTITY_CATEGORY)?,
            publish_initial_state: reader.optional_bool(CONF_PUBLISH_INITIAL_STATE, false)?,
        })
    }
}

/// Object ID the frontend uses for a named entity: snake case, `[a-z0-9_-]`
pub fn object_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c == ' ' {
                '_'
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Register `id` with the binary-sensor subsystem and apply entity settings
pub fn register_binary_sensor(batch: &mut Vec<Action>, id: &ComponentId, config: &BinarySensorSchema) {
    batch.push(Action::RegisterBinarySensor { id: id.clone() });

    if let Some(name) = &config.name {
        batch.push(Action::call(id, "set_name", vec![Expression::string(name)]));
        batch.push(Action::call(
            id,
            "set_object_id",
            vec![Expression::string(object_id(name))],
        ));
    }
    batch.push(Action::call(
        id,
        "set_disabled_by_default",
        vec![config.disabled_by_default.into()],
    ));
    if config.internal {
        batch.push(Action::call(id, "set_internal", vec![true.into()]));
    }
    if let Some(icon) = &config.icon {
        batch.push(Action::call(id, "set_icon", vec![Expression::string(icon)]));
    }
    if let Some(category) = config.entity_category {
        batch.push(Action::call(
            id,
            "set_entity_category",
            vec![Expression::raw(category.cpp_constant())],
        ));
    }
    if let Some(class) = &config.device_class {
        batch.push(Action::call(
            id,
            "set_device_class",
            vec![Expression::string(class)],
        ));
    }
    if config.publish_initial_state {
        batch.push(Action::call(id, "set_publish_initial_state", vec![true.into()]));
    }
}
