//! Component schemas and config bindings
//!
//! Each binding validates raw config entries into typed configs and turns
//! those into generation actions:
//!
//! - [`binary_sensor`] - fields and registration shared by all binary sensors
//! - [`ratgdo`] - the garage-door controller hub and its client schema
//! - [`ratgdo::binary_sensor`] - motion and obstruction sensors of a hub

pub mod binary_sensor;
mod error;
pub mod ratgdo;
mod registry;
mod schema;

pub use error::{ValidationError, ValidationResult};
pub use ratgdo::binary_sensor::RatgdoBinarySensorConfig;
pub use ratgdo::{RatgdoClientSchema, RatgdoHubConfig};
pub use registry::{Declaration, IdRegistry};
pub use schema::FieldReader;
