//! Core types for ratgdo code generation
//!
//! This crate provides the fundamental types shared by the config, codegen
//! and component crates: [`ComponentId`] and [`SensorType`].

mod id;
mod sensor_type;

pub use id::{ComponentId, IdError};
pub use sensor_type::{SensorType, SENSOR_TYPES};

/// Name of the integration, also the `platform:` value of its child entries
pub const DOMAIN: &str = "ratgdo";

/// C++ namespace the generated classes and enums live in
pub const NAMESPACE: &str = "ratgdo";

/// Generated class names
pub mod classes {
    /// Parent garage-door controller
    pub const RATGDO_COMPONENT: &str = "ratgdo::RATGDOComponent";

    /// Binary sensor attached to a controller
    pub const RATGDO_BINARY_SENSOR: &str = "ratgdo::RATGDOBinarySensor";

    /// Internal GPIO pin handed to a controller
    pub const ESP8266_GPIO_PIN: &str = "esphome::esp8266::ESP8266GPIOPin";
}
