//! Build pipeline
//!
//! Validates every ratgdo entry of a device document, then generates hubs
//! followed by their binary sensors into one build script. Nothing is
//! generated unless the whole document validates.

use rg_codegen::{BuildScript, CodegenError};
use rg_components::{IdRegistry, RatgdoBinarySensorConfig, RatgdoHubConfig, ValidationError};
use rg_config::{ConfigError, DeviceDocument};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to load configuration")]
    Config(#[from] ConfigError),

    #[error("invalid configuration")]
    Validation(#[from] ValidationError),

    #[error("code generation failed")]
    Codegen(#[from] CodegenError),
}

/// Validated entries of a document, ready to generate
#[derive(Debug)]
pub struct ValidatedDocument {
    pub device_name: Option<String>,
    pub hubs: Vec<RatgdoHubConfig>,
    pub binary_sensors: Vec<RatgdoBinarySensorConfig>,
}

/// Validate hubs first so children can resolve their parent
///
/// Explicit IDs are reserved up front so an ID generated for an earlier
/// entry never takes one written on a later entry.
pub fn validate(doc: &DeviceDocument) -> Result<ValidatedDocument, ValidationError> {
    let mut ids = IdRegistry::new();
    for entry in doc.hubs.iter().chain(&doc.binary_sensors) {
        ids.reserve_explicit(&entry.value);
    }

    let hubs = doc
        .hubs
        .iter()
        .map(|entry| RatgdoHubConfig::validate(&entry.value, &entry.path, &mut ids))
        .collect::<Result<Vec<_>, _>>()?;

    let binary_sensors = doc
        .binary_sensors
        .iter()
        .map(|entry| RatgdoBinarySensorConfig::validate(&entry.value, &entry.path, &mut ids))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedDocument {
        device_name: doc.device_name.clone(),
        hubs,
        binary_sensors,
    })
}

/// Generate a validated document into a fresh build script
pub fn generate(validated: &ValidatedDocument) -> Result<BuildScript, CodegenError> {
    let mut script = BuildScript::new();
    for hub in &validated.hubs {
        hub.generate(&mut script)?;
    }
    for sensor in &validated.binary_sensors {
        sensor.generate(&mut script)?;
    }

    info!(
        "Generated {} action(s) for {} hub(s) and {} binary sensor(s)",
        script.len(),
        validated.hubs.len(),
        validated.binary_sensors.len()
    );
    Ok(script)
}

/// Load, validate and generate a device config file
pub fn build_file(path: &Path) -> Result<(ValidatedDocument, BuildScript), BuildError> {
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file = path.file_name().map(Path::new).unwrap_or(path);

    let doc = DeviceDocument::load(config_dir, file)?;
    let validated = validate(&doc)?;
    let script = generate(&validated)?;
    Ok((validated, script))
}
