//! Build script accumulator
//!
//! The build script collects generation actions in emission order together
//! with the set of declared variables. Callers stage the actions for one
//! config entry and [`BuildScript::commit`] them as a unit: either every
//! action is appended or none is.

use indexmap::IndexMap;
use rg_core::ComponentId;
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, trace};

use crate::action::Action;
use crate::error::{CodegenError, CodegenResult};

/// Ordered generation actions plus the variables they declare
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildScript {
    /// Declared variables and their class, in declaration order
    variables: IndexMap<ComponentId, String>,
    actions: Vec<Action>,
}

impl BuildScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of actions atomically
    ///
    /// The batch is checked against the variables already declared plus the
    /// ones the batch declares before it; on any error the script is left
    /// untouched.
    pub fn commit(&mut self, batch: Vec<Action>) -> CodegenResult<()> {
        let mut declared: IndexMap<ComponentId, String> = IndexMap::new();

        for action in &batch {
            for id in action.references() {
                if !self.variables.contains_key(id) && !declared.contains_key(id) {
                    return Err(CodegenError::UnknownId {
                        id: id.clone(),
                        referenced_by: action.subject().to_string(),
                    });
                }
            }
            if let Action::NewVariable { id, class } = action {
                if self.variables.contains_key(id) || declared.contains_key(id) {
                    return Err(CodegenError::DuplicateId { id: id.clone() });
                }
                declared.insert(id.clone(), class.clone());
            }
        }

        for action in &batch {
            trace!("emit: {}", action.render());
        }
        debug!(
            "Committed {} action(s), {} new variable(s)",
            batch.len(),
            declared.len()
        );

        self.variables.extend(declared);
        self.actions.extend(batch);
        Ok(())
    }

    /// Class of a declared variable
    pub fn get_variable(&self, id: &ComponentId) -> Option<&str> {
        self.variables.get(id).map(String::as_str)
    }

    pub fn is_declared(&self, id: &ComponentId) -> bool {
        self.variables.contains_key(id)
    }

    /// Declared variables in declaration order
    pub fn variables(&self) -> impl Iterator<Item = (&ComponentId, &str)> {
        self.variables.iter().map(|(id, class)| (id, class.as_str()))
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Render global declarations followed by the setup body
    pub fn render_cpp(&self, device_name: Option<&str>) -> String {
        let mut out = String::new();

        if let Some(name) = device_name {
            // Escaped so control characters cannot end the comment line
            let _ = writeln!(out, "// Generated for device '{}'", name.escape_debug());
        }
        for (id, class) in &self.variables {
            let _ = writeln!(out, "{} *{};", class, id);
        }
        if !self.variables.is_empty() {
            out.push('\n');
        }

        out.push_str("void setup() {\n");
        for action in &self.actions {
            let _ = writeln!(out, "  {}", action.render());
        }
        out.push_str("  App.setup();\n}\n");
        out
    }

    /// Serialize the script as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;

    fn id(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    fn new_var(name: &str, class: &str) -> Action {
        Action::NewVariable {
            id: id(name),
            class: class.to_string(),
        }
    }

    #[test]
    fn test_commit_in_order() {
        let mut script = BuildScript::new();
        script
            .commit(vec![
                new_var("door1", "ratgdo::RATGDOComponent"),
                Action::RegisterComponent { id: id("door1") },
            ])
            .unwrap();

        assert_eq!(script.len(), 2);
        assert!(script.is_declared(&id("door1")));
        assert_eq!(
            script.get_variable(&id("door1")),
            Some("ratgdo::RATGDOComponent")
        );
    }

    #[test]
    fn test_unknown_reference_leaves_script_untouched() {
        let mut script = BuildScript::new();
        let err = script
            .commit(vec![
                new_var("sensor1", "ratgdo::RATGDOBinarySensor"),
                Action::RegisterChild {
                    id: id("sensor1"),
                    parent: id("door1"),
                },
            ])
            .unwrap_err();

        assert_eq!(
            err,
            CodegenError::UnknownId {
                id: id("door1"),
                referenced_by: "sensor1".to_string()
            }
        );
        assert!(script.is_empty());
        assert!(!script.is_declared(&id("sensor1")));
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut script = BuildScript::new();
        script.commit(vec![new_var("a", "X")]).unwrap();

        let err = script.commit(vec![new_var("a", "Y")]).unwrap_err();
        assert_eq!(err, CodegenError::DuplicateId { id: id("a") });

        let err = script
            .commit(vec![new_var("b", "X"), new_var("b", "X")])
            .unwrap_err();
        assert_eq!(err, CodegenError::DuplicateId { id: id("b") });
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn test_call_argument_must_be_declared() {
        let mut script = BuildScript::new();
        script.commit(vec![new_var("a", "X")]).unwrap();

        let result = script.commit(vec![Action::call(
            &id("a"),
            "set_peer",
            vec![Expression::Id(id("ghost"))],
        )]);
        assert!(matches!(result, Err(CodegenError::UnknownId { .. })));
    }

    #[test]
    fn test_render_cpp() {
        let mut script = BuildScript::new();
        script
            .commit(vec![
                new_var("door1", "ratgdo::RATGDOComponent"),
                Action::RegisterComponent { id: id("door1") },
            ])
            .unwrap();

        let cpp = script.render_cpp(Some("garage"));
        assert_eq!(
            cpp,
            "// Generated for device 'garage'\n\
             ratgdo::RATGDOComponent *door1;\n\
             \n\
             void setup() {\n  \
             door1 = new ratgdo::RATGDOComponent();\n  \
             App.register_component(door1);\n  \
             App.setup();\n\
             }\n"
        );
    }

    #[test]
    fn test_render_cpp_escapes_device_name() {
        let cpp = BuildScript::new().render_cpp(Some("garage\nApp.teardown();"));
        assert!(cpp.starts_with("// Generated for device 'garage\\nApp.teardown();'\n"));
        assert_eq!(cpp.lines().filter(|l| l.contains("teardown")).count(), 1);
    }

    #[test]
    fn test_to_json() {
        let mut script = BuildScript::new();
        script.commit(vec![new_var("door1", "X")]).unwrap();

        let json: serde_json::Value = serde_json::from_str(&script.to_json().unwrap()).unwrap();
        assert_eq!(json["variables"]["door1"], "X");
        assert_eq!(json["actions"][0]["action"], "new_variable");
    }
}
