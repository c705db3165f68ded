//! Code generation model
//!
//! Components translate validated config into [`Action`]s and commit them to
//! a [`BuildScript`], which renders the generated C++ setup code or
//! serializes the action list as JSON for another backend.

mod action;
mod error;
mod expr;
mod script;

pub use action::Action;
pub use error::{CodegenError, CodegenResult};
pub use expr::Expression;
pub use script::BuildScript;
