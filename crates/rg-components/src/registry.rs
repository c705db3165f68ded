//! IDs declared during validation
//!
//! Validation runs over every entry of a document before anything is
//! generated, so duplicate IDs and dangling parent references are caught
//! here rather than half way through generation.

use indexmap::{IndexMap, IndexSet};
use rg_core::ComponentId;
use serde_yaml::Value;
use tracing::{debug, trace};

use crate::error::{ValidationError, ValidationResult};

/// A declared ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Generated class of the object
    pub class: &'static str,
    /// Entry path that declared it
    pub path: String,
}

/// Registry of IDs declared so far, in declaration order
#[derive(Debug, Default)]
pub struct IdRegistry {
    declared: IndexMap<ComponentId, Declaration>,
    /// Explicit IDs of entries not validated yet; never handed out by
    /// [`IdRegistry::generate_id`]
    reserved: IndexSet<ComponentId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an ID for an object of `class`
    pub fn declare(
        &mut self,
        id: &ComponentId,
        class: &'static str,
        path: &str,
    ) -> ValidationResult<()> {
        if let Some(first) = self.declared.get(id) {
            return Err(ValidationError::DuplicateId {
                path: path.to_string(),
                id: id.clone(),
                first: first.path.clone(),
            });
        }
        debug!("Declared {} ({}) at {}", id, class, path);
        self.declared.insert(
            id.clone(),
            Declaration {
                class,
                path: path.to_string(),
            },
        );
        Ok(())
    }

    /// Keep `id` out of generated IDs without declaring it
    pub fn reserve(&mut self, id: ComponentId) {
        trace!("Reserved {}", id);
        self.reserved.insert(id);
    }

    /// Reserve the explicit `id` of a raw entry, if it has a usable one
    ///
    /// Invalid IDs are skipped here and reported when the entry validates.
    pub fn reserve_explicit(&mut self, raw: &Value) {
        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| ComponentId::new(s).ok());
        if let Some(id) = id {
            self.reserve(id);
        }
    }

    fn is_taken(&self, id: &ComponentId) -> bool {
        self.declared.contains_key(id) || self.reserved.contains(id)
    }

    /// Pick an unused ID derived from `hint`
    ///
    /// The first candidate is `<prefix>_<hint>`; on collision `_2`, `_3`, ...
    /// are appended.
    pub fn generate_id(&self, prefix: &str, hint: &str) -> ValidationResult<ComponentId> {
        let base = ComponentId::from_name(prefix, hint).map_err(|source| {
            ValidationError::InvalidId {
                path: prefix.to_string(),
                field: "id".to_string(),
                source,
            }
        })?;

        if !self.is_taken(&base) {
            return Ok(base);
        }
        let mut n = 2;
        loop {
            let candidate = base.with_suffix(n);
            if !self.is_taken(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub fn get(&self, id: &ComponentId) -> Option<&Declaration> {
        self.declared.get(id)
    }

    /// IDs declared with `class`, in declaration order
    pub fn ids_of_class(&self, class: &str) -> Vec<&ComponentId> {
        self.declared
            .iter()
            .filter(|(_, decl)| decl.class == class)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
