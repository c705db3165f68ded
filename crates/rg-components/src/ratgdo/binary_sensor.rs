//! ratgdo binary sensor
//!
//! Config binding for `binary_sensor:` entries with `platform: ratgdo`:
//!
//! ```yaml
//! binary_sensor:
//!   - platform: ratgdo
//!     id: garage_motion
//!     ratgdo_id: door1
//!     type: motion
//!     name: Garage Motion
//! ```
//!
//! [`validate`] composes the generic binary-sensor schema, the `type` field
//! and the ratgdo client schema. [`generate`] emits the sensor's setup in a
//! fixed order: construct, register as binary sensor, register as component,
//! set the sensor type, attach to the hub.

use rg_codegen::{Action, BuildScript, CodegenResult, Expression};
use rg_core::{classes, SensorType};
use serde_yaml::Value;
use tracing::debug;

use super::{register_ratgdo_child, RatgdoClientSchema};
use crate::binary_sensor::{register_binary_sensor, BinarySensorSchema};
use crate::error::{ValidationError, ValidationResult};
use crate::registry::IdRegistry;
use crate::schema::FieldReader;

pub const CONF_TYPE: &str = "type";

/// Prefix of IDs generated for unnamed entries
const ID_PREFIX: &str = "ratgdo_binary_sensor";

/// A validated ratgdo binary-sensor entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatgdoBinarySensorConfig {
    pub base: BinarySensorSchema,
    pub sensor_type: SensorType,
    pub client: RatgdoClientSchema,
}

impl RatgdoBinarySensorConfig {
    /// Validate a raw entry and declare its ID
    ///
    /// `type` is checked first, then the generic binary-sensor fields, then
    /// the parent reference. The first failure is returned and nothing is
    /// declared.
    pub fn validate(raw: &Value, path: &str, ids: &mut IdRegistry) -> ValidationResult<Self> {
        let mut reader = FieldReader::new(path, raw)?;

        let label = reader.required_string(CONF_TYPE)?;
        let sensor_type = SensorType::resolve(&label).ok_or_else(|| ValidationError::UnknownValue {
            path: path.to_string(),
            field: CONF_TYPE.to_string(),
            value: label.clone(),
            allowed: SensorType::labels().into_iter().map(String::from).collect(),
        })?;

        let base = BinarySensorSchema::validate(&mut reader, ids, ID_PREFIX, sensor_type.label())?;
        let client = RatgdoClientSchema::validate(&mut reader, ids)?;
        reader.finish()?;

        ids.declare(&base.id, classes::RATGDO_BINARY_SENSOR, path)?;
        debug!(
            "Validated {}: {} ({}) on {}",
            path, base.id, sensor_type, client.ratgdo_id
        );

        Ok(Self {
            base,
            sensor_type,
            client,
        })
    }

    /// The generation actions for this entry, in emission order
    pub fn actions(&self) -> Vec<Action> {
        let id = &self.base.id;
        let mut batch = vec![Action::NewVariable {
            id: id.clone(),
            class: classes::RATGDO_BINARY_SENSOR.to_string(),
        }];
        register_binary_sensor(&mut batch, id, &self.base);
        batch.push(Action::RegisterComponent { id: id.clone() });
        batch.push(Action::call(
            id,
            "set_binary_sensor_type",
            vec![Expression::raw(self.sensor_type.cpp_constant())],
        ));
        register_ratgdo_child(&mut batch, id, &self.client);
        batch
    }

    /// Append this entry's actions to `script`
    ///
    /// The parent hub must already be generated. On error nothing is
    /// appended.
    pub fn generate(&self, script: &mut BuildScript) -> CodegenResult<()> {
        debug!("Generating ratgdo binary sensor {}", self.base.id);
        script.commit(self.actions())
    }
}

/// Validate one raw entry against an ID registry
pub fn validate(raw: &Value, path: &str, ids: &mut IdRegistry) -> ValidationResult<RatgdoBinarySensorConfig> {
    RatgdoBinarySensorConfig::validate(raw, path, ids)
}

/// Generate one validated entry into `script`
pub fn generate(config: &RatgdoBinarySensorConfig, script: &mut BuildScript) -> CodegenResult<()> {
    config.generate(script)
}
