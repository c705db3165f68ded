//! ratgdo garage-door controller
//!
//! The hub component (`ratgdo:`) owns the connection to the door opener.
//! Child platforms attach to a hub through the client schema's
//! `ratgdo_id` reference.

pub mod binary_sensor;

use regex::Regex;
use rg_codegen::{Action, Expression};
use rg_core::{classes, ComponentId};
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::registry::IdRegistry;
use crate::schema::FieldReader;

pub const CONF_RATGDO_ID: &str = "ratgdo_id";
/// Accepted in place of `ratgdo_id`
pub const CONF_PARENT: &str = "parent";
pub const CONF_OUTPUT_GDO: &str = "output_gdo_pin";
pub const CONF_INPUT_GDO: &str = "input_gdo_pin";
pub const CONF_INPUT_OBST: &str = "input_obst_pin";

const DEFAULT_OUTPUT_GDO: &str = "D1";
const DEFAULT_INPUT_GDO: &str = "D2";
const DEFAULT_INPUT_OBST: &str = "D7";

/// NodeMCU-style D pin labels to GPIO numbers
static D_PINS: &[u8] = &[16, 5, 4, 0, 2, 14, 12, 13, 15];

fn pin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?i)(?:(D)|GPIO)?(\d+)$").expect("pin pattern"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PinSpec {
    Number(u8),
    Name(String),
}

/// Resolve a pin label (`D1`, `GPIO5`, `5`) to its GPIO number
pub fn resolve_pin(label: &str) -> Option<u8> {
    let caps = pin_pattern().captures(label.trim())?;
    let n: usize = caps[2].parse().ok()?;
    if caps.get(1).is_some() {
        D_PINS.get(n).copied()
    } else {
        u8::try_from(n).ok().filter(|n| *n <= 39)
    }
}

/// Direction of a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

impl PinMode {
    pub fn cpp_flags(&self) -> &'static str {
        match self {
            PinMode::Input => "gpio::Flags::FLAG_INPUT",
            PinMode::Output => "gpio::Flags::FLAG_OUTPUT",
        }
    }
}

/// A pin object constructed for the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioPin {
    pub id: ComponentId,
    pub number: u8,
    pub mode: PinMode,
}

impl GpioPin {
    /// Declare a pin object named after its hub and config key
    fn declare(
        ids: &mut IdRegistry,
        hub: &ComponentId,
        key: &str,
        number: u8,
        mode: PinMode,
        path: &str,
    ) -> ValidationResult<Self> {
        let id = ids.generate_id(hub.as_str(), key)?;
        ids.declare(&id, classes::ESP8266_GPIO_PIN, path)?;
        Ok(Self { id, number, mode })
    }

    fn push_actions(&self, batch: &mut Vec<Action>) {
        batch.push(Action::NewVariable {
            id: self.id.clone(),
            class: classes::ESP8266_GPIO_PIN.to_string(),
        });
        batch.push(Action::call(&self.id, "set_pin", vec![Expression::Int(self.number.into())]));
        batch.push(Action::call(&self.id, "set_inverted", vec![false.into()]));
        batch.push(Action::call(
            &self.id,
            "set_flags",
            vec![Expression::raw(self.mode.cpp_flags())],
        ));
    }
}

fn read_pin(reader: &mut FieldReader<'_>, key: &'static str, default: &str) -> ValidationResult<u8> {
    let label = match reader.optional::<PinSpec>(key)? {
        None => default.to_string(),
        Some(PinSpec::Number(n)) => n.to_string(),
        Some(PinSpec::Name(s)) => s,
    };
    resolve_pin(&label).ok_or_else(|| reader.invalid(key, format!("unknown pin '{}'", label)))
}

/// Validated `ratgdo:` hub entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatgdoHubConfig {
    pub id: ComponentId,
    pub output_gdo_pin: GpioPin,
    pub input_gdo_pin: GpioPin,
    pub input_obst_pin: GpioPin,
}

impl RatgdoHubConfig {
    /// Validate a hub entry and declare its ID and pin objects
    pub fn validate(raw: &serde_yaml::Value, path: &str, ids: &mut IdRegistry) -> ValidationResult<Self> {
        let mut reader = FieldReader::new(path, raw)?;

        let id = reader
            .optional_id("id")?
            .ok_or_else(|| reader.missing("id"))?;
        let output_gdo = read_pin(&mut reader, CONF_OUTPUT_GDO, DEFAULT_OUTPUT_GDO)?;
        let input_gdo = read_pin(&mut reader, CONF_INPUT_GDO, DEFAULT_INPUT_GDO)?;
        let input_obst = read_pin(&mut reader, CONF_INPUT_OBST, DEFAULT_INPUT_OBST)?;
        reader.finish()?;

        ids.declare(&id, classes::RATGDO_COMPONENT, path)?;
        Ok(Self {
            output_gdo_pin: GpioPin::declare(ids, &id, CONF_OUTPUT_GDO, output_gdo, PinMode::Output, path)?,
            input_gdo_pin: GpioPin::declare(ids, &id, CONF_INPUT_GDO, input_gdo, PinMode::Input, path)?,
            input_obst_pin: GpioPin::declare(ids, &id, CONF_INPUT_OBST, input_obst, PinMode::Input, path)?,
            id,
        })
    }

    /// Emit the hub's construction, then each pin object and its setter
    pub fn generate(&self, script: &mut rg_codegen::BuildScript) -> rg_codegen::CodegenResult<()> {
        let id = &self.id;
        let mut batch = vec![
            Action::NewVariable {
                id: id.clone(),
                class: classes::RATGDO_COMPONENT.to_string(),
            },
            Action::RegisterComponent { id: id.clone() },
        ];
        for (setter, pin) in [
            ("set_output_gdo_pin", &self.output_gdo_pin),
            ("set_input_gdo_pin", &self.input_gdo_pin),
            ("set_input_obst_pin", &self.input_obst_pin),
        ] {
            pin.push_actions(&mut batch);
            batch.push(Action::call(id, setter, vec![Expression::Id(pin.id.clone())]));
        }
        debug!("Generating ratgdo hub {}", id);
        script.commit(batch)
    }
}

/// Validated ratgdo client fields: the parent hub reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatgdoClientSchema {
    pub ratgdo_id: ComponentId,
}

impl RatgdoClientSchema {
    /// Validate the parent reference of a child entry
    ///
    /// An explicit `ratgdo_id` (or `parent`) must name a declared hub. When
    /// omitted, the only declared hub is used.
    pub fn validate(reader: &mut FieldReader<'_>, ids: &IdRegistry) -> ValidationResult<Self> {
        let explicit = reader.optional_id(CONF_RATGDO_ID)?;
        let alias = reader.optional_id(CONF_PARENT)?;

        let ratgdo_id = match (explicit, alias) {
            (Some(_), Some(_)) => {
                return Err(reader.invalid(
                    CONF_RATGDO_ID,
                    format!("'{}' and '{}' are mutually exclusive", CONF_RATGDO_ID, CONF_PARENT),
                ))
            }
            (Some(id), None) | (None, Some(id)) => {
                let is_hub = ids
                    .get(&id)
                    .is_some_and(|decl| decl.class == classes::RATGDO_COMPONENT);
                if !is_hub {
                    return Err(ValidationError::UnknownParent {
                        path: reader.path().to_string(),
                        field: CONF_RATGDO_ID.to_string(),
                        id,
                        expected: classes::RATGDO_COMPONENT.to_string(),
                    });
                }
                id
            }
            (None, None) => {
                let hubs = ids.ids_of_class(classes::RATGDO_COMPONENT);
                match hubs.as_slice() {
                    [only] => (*only).clone(),
                    [] => {
                        return Err(ValidationError::NoParent {
                            path: reader.path().to_string(),
                            field: CONF_RATGDO_ID.to_string(),
                            expected: classes::RATGDO_COMPONENT.to_string(),
                        })
                    }
                    several => {
                        return Err(ValidationError::AmbiguousParent {
                            path: reader.path().to_string(),
                            field: CONF_RATGDO_ID.to_string(),
                            expected: classes::RATGDO_COMPONENT.to_string(),
                            candidates: several.iter().map(|id| id.to_string()).collect(),
                        })
                    }
                }
            }
        };

        Ok(Self { ratgdo_id })
    }
}

/// Attach `id` to its parent hub
pub fn register_ratgdo_child(batch: &mut Vec<Action>, id: &ComponentId, client: &RatgdoClientSchema) {
    batch.push(Action::RegisterChild {
        id: id.clone(),
        parent: client.ratgdo_id.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_codegen::BuildScript;
    use serde_yaml::Value;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn id(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    #[test]
    fn test_resolve_pin() {
        assert_eq!(resolve_pin("D1"), Some(5));
        assert_eq!(resolve_pin("d7"), Some(13));
        assert_eq!(resolve_pin("GPIO4"), Some(4));
        assert_eq!(resolve_pin("14"), Some(14));
        assert_eq!(resolve_pin("D9"), None);
        assert_eq!(resolve_pin("GPIO99"), None);
        assert_eq!(resolve_pin("A0"), None);
    }

    #[test]
    fn test_hub_defaults() {
        let mut ids = IdRegistry::new();
        let hub = RatgdoHubConfig::validate(&yaml("id: door1\n"), "ratgdo", &mut ids).unwrap();
        assert_eq!(hub.output_gdo_pin.number, 5);
        assert_eq!(hub.output_gdo_pin.mode, PinMode::Output);
        assert_eq!(hub.input_gdo_pin.number, 4);
        assert_eq!(hub.input_obst_pin.number, 13);
        assert_eq!(hub.input_obst_pin.id, id("door1_input_obst_pin"));
        assert!(ids.get(&id("door1")).is_some());
        assert_eq!(ids.ids_of_class(classes::ESP8266_GPIO_PIN).len(), 3);
        assert_eq!(ids.ids_of_class(classes::RATGDO_COMPONENT), vec![&id("door1")]);
    }

    #[test]
    fn test_hub_requires_id() {
        let err = RatgdoHubConfig::validate(&yaml("input_gdo_pin: D5\n"), "ratgdo", &mut IdRegistry::new())
            .unwrap_err();
        assert_eq!(err.field(), Some("id"));
    }

    #[test]
    fn test_hub_rejects_bad_pin_and_extra_keys() {
        let mut ids = IdRegistry::new();
        let err = RatgdoHubConfig::validate(&yaml("id: a\noutput_gdo_pin: X3\n"), "ratgdo", &mut ids)
            .unwrap_err();
        assert_eq!(err.field(), Some(CONF_OUTPUT_GDO));

        let err = RatgdoHubConfig::validate(&yaml("id: b\nprotocol: secplus_v9\n"), "ratgdo", &mut ids)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ExtraKeys { .. }));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_hub_generate() {
        let mut ids = IdRegistry::new();
        let hub = RatgdoHubConfig::validate(&yaml("id: door1\ninput_obst_pin: GPIO12\n"), "ratgdo", &mut ids)
            .unwrap();
        let mut script = BuildScript::new();
        hub.generate(&mut script).unwrap();

        let rendered: Vec<String> = script.actions().iter().map(Action::render).collect();
        assert_eq!(
            rendered,
            vec![
                "door1 = new ratgdo::RATGDOComponent();",
                "App.register_component(door1);",
                "door1_output_gdo_pin = new esphome::esp8266::ESP8266GPIOPin();",
                "door1_output_gdo_pin->set_pin(5);",
                "door1_output_gdo_pin->set_inverted(false);",
                "door1_output_gdo_pin->set_flags(gpio::Flags::FLAG_OUTPUT);",
                "door1->set_output_gdo_pin(door1_output_gdo_pin);",
                "door1_input_gdo_pin = new esphome::esp8266::ESP8266GPIOPin();",
                "door1_input_gdo_pin->set_pin(4);",
                "door1_input_gdo_pin->set_inverted(false);",
                "door1_input_gdo_pin->set_flags(gpio::Flags::FLAG_INPUT);",
                "door1->set_input_gdo_pin(door1_input_gdo_pin);",
                "door1_input_obst_pin = new esphome::esp8266::ESP8266GPIOPin();",
                "door1_input_obst_pin->set_pin(12);",
                "door1_input_obst_pin->set_inverted(false);",
                "door1_input_obst_pin->set_flags(gpio::Flags::FLAG_INPUT);",
                "door1->set_input_obst_pin(door1_input_obst_pin);",
            ]
        );
    }

    #[test]
    fn test_pin_ids_avoid_user_ids() {
        let mut ids = IdRegistry::new();
        ids.reserve(id("door1_output_gdo_pin"));
        let hub = RatgdoHubConfig::validate(&yaml("id: door1\n"), "ratgdo", &mut ids).unwrap();
        assert_eq!(hub.output_gdo_pin.id, id("door1_output_gdo_pin_2"));
    }

    fn client(yaml_text: &str, ids: &IdRegistry) -> ValidationResult<RatgdoClientSchema> {
        let raw = yaml(yaml_text);
        let mut reader = FieldReader::new("binary_sensor.0", &raw)?;
        RatgdoClientSchema::validate(&mut reader, ids)
    }

    #[test]
    fn test_client_reference() {
        let mut ids = IdRegistry::new();
        ids.declare(&id("door1"), classes::RATGDO_COMPONENT, "ratgdo.0").unwrap();
        ids.declare(&id("door2"), classes::RATGDO_COMPONENT, "ratgdo.1").unwrap();
        ids.declare(&id("sensor1"), classes::RATGDO_BINARY_SENSOR, "binary_sensor.0")
            .unwrap();

        assert_eq!(client("ratgdo_id: door2\n", &ids).unwrap().ratgdo_id, id("door2"));
        assert_eq!(client("parent: door1\n", &ids).unwrap().ratgdo_id, id("door1"));

        let err = client("ratgdo_id: sensor1\n", &ids).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParent { .. }));

        let err = client("{}\n", &ids).unwrap_err();
        assert!(matches!(err, ValidationError::AmbiguousParent { ref candidates, .. } if candidates.len() == 2));

        let err = client("ratgdo_id: door1\nparent: door2\n", &ids).unwrap_err();
        assert_eq!(err.field(), Some(CONF_RATGDO_ID));
    }

    #[test]
    fn test_client_defaults_to_single_hub() {
        let mut ids = IdRegistry::new();
        assert!(matches!(
            client("{}\n", &ids),
            Err(ValidationError::NoParent { .. })
        ));

        ids.declare(&id("door1"), classes::RATGDO_COMPONENT, "ratgdo").unwrap();
        assert_eq!(client("{}\n", &ids).unwrap().ratgdo_id, id("door1"));
    }
}
