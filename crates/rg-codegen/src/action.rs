//! Generation actions
//!
//! An action is one discrete emission step of the generated program, such
//! as allocating an object or calling a setter on it.

use rg_core::ComponentId;
use serde::{Deserialize, Serialize};

use crate::expr::Expression;

/// One generated statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Allocate a new object of `class` bound to `id`
    NewVariable { id: ComponentId, class: String },

    /// Hand the object to the application's component loop
    RegisterComponent { id: ComponentId },

    /// Hand the object to the application's binary-sensor registry
    RegisterBinarySensor { id: ComponentId },

    /// Call `method` on `target`
    Call {
        target: ComponentId,
        method: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Expression>,
    },

    /// Attach `id` to its parent controller
    RegisterChild { id: ComponentId, parent: ComponentId },
}

impl Action {
    /// Shorthand for a setter call
    pub fn call(target: &ComponentId, method: &str, args: Vec<Expression>) -> Self {
        Action::Call {
            target: target.clone(),
            method: method.to_string(),
            args,
        }
    }

    /// The object this action operates on
    pub fn subject(&self) -> &ComponentId {
        match self {
            Action::NewVariable { id, .. }
            | Action::RegisterComponent { id }
            | Action::RegisterBinarySensor { id }
            | Action::RegisterChild { id, .. } => id,
            Action::Call { target, .. } => target,
        }
    }

    /// Every variable this action reads, other than one it declares
    pub fn references(&self) -> Vec<&ComponentId> {
        match self {
            Action::NewVariable { .. } => Vec::new(),
            Action::RegisterComponent { id } | Action::RegisterBinarySensor { id } => vec![id],
            Action::Call { target, args, .. } => std::iter::once(target)
                .chain(args.iter().filter_map(Expression::referenced_id))
                .collect(),
            Action::RegisterChild { id, parent } => vec![id, parent],
        }
    }

    /// Render as a C++ statement
    pub fn render(&self) -> String {
        match self {
            Action::NewVariable { id, class } => format!("{} = new {}();", id, class),
            Action::RegisterComponent { id } => format!("App.register_component({});", id),
            Action::RegisterBinarySensor { id } => {
                format!("App.register_binary_sensor({});", id)
            }
            Action::Call {
                target,
                method,
                args,
            } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                format!("{}->{}({});", target, method, args.join(", "))
            }
            Action::RegisterChild { id, parent } => format!("{}->set_parent({});", id, parent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    #[test]
    fn test_render() {
        let new = Action::NewVariable {
            id: id("sensor1"),
            class: "ratgdo::RATGDOBinarySensor".to_string(),
        };
        assert_eq!(new.render(), "sensor1 = new ratgdo::RATGDOBinarySensor();");

        assert_eq!(
            Action::RegisterComponent { id: id("sensor1") }.render(),
            "App.register_component(sensor1);"
        );
        assert_eq!(
            Action::RegisterBinarySensor { id: id("sensor1") }.render(),
            "App.register_binary_sensor(sensor1);"
        );
        assert_eq!(
            Action::call(&id("sensor1"), "set_name", vec![Expression::string("Motion")]).render(),
            "sensor1->set_name(\"Motion\");"
        );
        assert_eq!(
            Action::RegisterChild {
                id: id("sensor1"),
                parent: id("door1")
            }
            .render(),
            "sensor1->set_parent(door1);"
        );
    }

    #[test]
    fn test_references() {
        let call = Action::call(
            &id("sensor1"),
            "set_peer",
            vec![Expression::Id(id("other")), Expression::Bool(true)],
        );
        assert_eq!(call.references(), vec![&id("sensor1"), &id("other")]);
        assert_eq!(call.subject(), &id("sensor1"));

        let new = Action::NewVariable {
            id: id("x"),
            class: "X".to_string(),
        };
        assert!(new.references().is_empty());
    }

    #[test]
    fn test_json_shape() {
        let action = Action::RegisterChild {
            id: id("sensor1"),
            parent: id("door1"),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "register_child", "id": "sensor1", "parent": "door1"})
        );
    }
}
