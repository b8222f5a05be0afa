//! Minimal configuration schema: required keys and per-property JSON types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON type a configuration property must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    /// A JSON string.
    String,
    /// Any JSON number.
    Number,
    /// A JSON number without a fractional part.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// Any value.
    Any,
}

impl ConfigType {
    /// Returns whether `value` has this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// Schema for a plugin configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Declared properties and their types.
    #[serde(default)]
    pub properties: BTreeMap<String, ConfigType>,
    /// Keys that must be present.
    #[serde(default)]
    pub required: Vec<String>,
    /// Reject keys not listed in `properties`.
    #[serde(default)]
    pub deny_unknown: bool,
}

impl ConfigSchema {
    /// Creates an empty schema that accepts any object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an optional property.
    pub fn property(mut self, name: impl Into<String>, ty: ConfigType) -> Self {
        self.properties.insert(name.into(), ty);
        self
    }

    /// Declares a required property.
    pub fn required(mut self, name: impl Into<String>, ty: ConfigType) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), ty);
        self.required.push(name);
        self
    }

    /// Rejects keys that are not declared.
    pub fn deny_unknown(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    /// Checks `config` against the schema, returning the first violation.
    pub fn validate(&self, config: &Value) -> Result<(), String> {
        let Some(object) = config.as_object() else {
            return Err("configuration must be an object".to_string());
        };

        if let Some(missing) = self.required.iter().find(|key| !object.contains_key(*key)) {
            return Err(format!("missing required key '{missing}'"));
        }

        for (key, value) in object {
            match self.properties.get(key) {
                Some(ty) if !ty.accepts(value) => {
                    return Err(format!("key '{key}' must be of type {ty}"));
                }
                None if self.deny_unknown => {
                    return Err(format!("unknown key '{key}'"));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
