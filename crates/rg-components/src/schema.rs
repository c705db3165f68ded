//! Field access over a raw config mapping
//!
//! Several schemas validate parts of one entry. Each reads the keys it owns
//! through a shared [`FieldReader`], which remembers which keys were claimed
//! so that [`FieldReader::finish`] can reject the leftovers.

use rg_core::ComponentId;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

use crate::error::{ValidationError, ValidationResult};

pub struct FieldReader<'a> {
    path: String,
    map: &'a Mapping,
    claimed: HashSet<&'static str>,
}

impl<'a> FieldReader<'a> {
    pub fn new(path: impl Into<String>, raw: &'a Value) -> ValidationResult<Self> {
        let path = path.into();
        match raw.as_mapping() {
            Some(map) => Ok(Self {
                path,
                map,
                claimed: HashSet::new(),
            }),
            None => Err(ValidationError::NotAMapping { path }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Claim `key` and return its raw value; explicit nulls count as absent
    pub fn raw(&mut self, key: &'static str) -> Option<&'a Value> {
        self.claimed.insert(key);
        let map: &'a Mapping = self.map;
        map.get(key).filter(|v| !v.is_null())
    }

    pub fn optional<T: DeserializeOwned>(&mut self, key: &'static str) -> ValidationResult<Option<T>> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.invalid(key, e.to_string())),
        }
    }

    pub fn required<T: DeserializeOwned>(&mut self, key: &'static str) -> ValidationResult<T> {
        self.optional(key)?.ok_or_else(|| self.missing(key))
    }

    /// Read a string; numbers and booleans are taken as written
    pub fn optional_string(&mut self, key: &'static str) -> ValidationResult<Option<String>> {
        match self.raw(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(self.invalid(key, "expected a string")),
        }
    }

    pub fn required_string(&mut self, key: &'static str) -> ValidationResult<String> {
        self.optional_string(key)?.ok_or_else(|| self.missing(key))
    }

    /// Read a string and lower-case it
    pub fn optional_lower(&mut self, key: &'static str) -> ValidationResult<Option<String>> {
        Ok(self.optional_string(key)?.map(|s| s.to_lowercase()))
    }

    /// Read a boolean
    ///
    /// Substitutions and `!env_var` always yield strings, so `true`/`false`,
    /// `yes`/`no` and `on`/`off` are accepted in any case.
    pub fn optional_bool(&mut self, key: &'static str, default: bool) -> ValidationResult<bool> {
        match self.raw(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => parse_bool(s).ok_or_else(|| {
                self.invalid(key, format!("expected a boolean, got '{}'", s))
            }),
            Some(_) => Err(self.invalid(key, "expected a boolean")),
        }
    }

    pub fn optional_id(&mut self, key: &'static str) -> ValidationResult<Option<ComponentId>> {
        match self.optional_string(key)? {
            None => Ok(None),
            Some(s) => ComponentId::new(s)
                .map(Some)
                .map_err(|source| ValidationError::InvalidId {
                    path: self.path.clone(),
                    field: key.to_string(),
                    source,
                }),
        }
    }

    pub fn missing(&self, key: &str) -> ValidationError {
        ValidationError::MissingField {
            path: self.path.clone(),
            field: key.to_string(),
        }
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidValue {
            path: self.path.clone(),
            field: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Reject keys no schema claimed
    pub fn finish(self) -> ValidationResult<()> {
        let extra: Vec<String> = self
            .map
            .keys()
            .filter(|k| !k.as_str().is_some_and(|k| self.claimed.contains(k)))
            .map(|k| match k.as_str() {
                Some(s) => s.to_string(),
                None => format!("{:?}", k),
            })
            .collect();

        if extra.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ExtraKeys {
                path: self.path,
                keys: extra,
            })
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "enable" => Some(true),
        "false" | "no" | "off" | "disable" => Some(false),
        _ => None,
    }
}
