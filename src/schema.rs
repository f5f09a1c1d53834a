//! Option schemas for generation steps
//!
//! Every step declares the shape of its options as an [`OptionsSchema`].
//! Options are checked against it before the step is deserialized or run,
//! and every rejection names the offending field.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;

/// Accepted JSON type of an option field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Number,
    Object,
    /// An array of strings
    List,
    /// A string restricted to the listed values
    OneOf(&'static [&'static str]),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Object => write!(f, "object"),
            FieldKind::List => write!(f, "list of strings"),
            FieldKind::OneOf(values) => write!(f, "one of {}", values.join("|")),
        }
    }
}

/// A single option field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// camelCase option name
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// The declared option shape of one generation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsSchema {
    pub generator: &'static str,
    pub fields: &'static [Field],
}

impl OptionsSchema {
    /// Check `options` against this schema.
    ///
    /// Rejects non-object options, missing required fields, values of the
    /// wrong type, values outside a `OneOf` list, and fields the schema does
    /// not declare. `null` counts as absent.
    pub fn validate(&self, options: &Value) -> Result<()> {
        let Some(object) = options.as_object() else {
            return Err(Error::validation(
                "options",
                format!("options for '{}' must be an object", self.generator),
            ));
        };

        for (key, value) in object {
            let Some(field) = self.fields.iter().find(|f| f.name == key) else {
                return Err(Error::validation(
                    key.clone(),
                    format!("unknown option for '{}'", self.generator),
                ));
            };
            if !value.is_null() {
                check_kind(field, value)?;
            }
        }

        for field in self.fields.iter().filter(|f| f.required) {
            if object.get(field.name).map_or(true, Value::is_null) {
                return Err(Error::validation(
                    field.name,
                    format!("required option for '{}' is missing", self.generator),
                ));
            }
        }

        Ok(())
    }
}

fn check_kind(field: &Field, value: &Value) -> Result<()> {
    let ok = match field.kind {
        FieldKind::String => value.is_string(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Number => value.is_number(),
        FieldKind::Object => value.is_object(),
        FieldKind::List => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::OneOf(allowed) => value.as_str().is_some_and(|v| allowed.contains(&v)),
    };

    if ok {
        Ok(())
    } else {
        Err(Error::validation(
            field.name,
            format!("expected {}, got {}", field.kind, value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: OptionsSchema = OptionsSchema {
        generator: "demo",
        fields: &[
            Field::required("name", FieldKind::String),
            Field::optional("publishable", FieldKind::Boolean),
            Field::optional("bundler", FieldKind::OneOf(&["tsc", "swc", "none"])),
            Field::optional("substitutions", FieldKind::Object),
            Field::optional("verbatim", FieldKind::List),
        ],
    };

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_options() {
        SCHEMA
            .validate(&json!({"name": "a", "publishable": true, "bundler": "swc"}))
            .unwrap();
        SCHEMA.validate(&json!({"name": "a", "bundler": null})).unwrap();
    }

    #[test]
    fn test_missing_required_field() {
        assert_eq!(field_of(SCHEMA.validate(&json!({})).unwrap_err()), "name");
        assert_eq!(field_of(SCHEMA.validate(&json!({"name": null})).unwrap_err()), "name");
    }

    #[test]
    fn test_wrong_type_names_field() {
        let err = SCHEMA.validate(&json!({"name": "a", "publishable": "yes"})).unwrap_err();
        assert!(err.to_string().contains("expected boolean"));
        assert_eq!(field_of(err), "publishable");
    }

    #[test]
    fn test_value_outside_one_of() {
        let err = SCHEMA.validate(&json!({"name": "a", "bundler": "webpack"})).unwrap_err();
        assert!(err.to_string().contains("tsc|swc|none"));
        assert_eq!(field_of(err), "bundler");
    }

    #[test]
    fn test_list_of_strings() {
        SCHEMA.validate(&json!({"name": "a", "verbatim": ["*.png", "assets/**"]})).unwrap();
        let err = SCHEMA.validate(&json!({"name": "a", "verbatim": ["*.png", 3]})).unwrap_err();
        assert_eq!(field_of(err), "verbatim");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SCHEMA.validate(&json!({"name": "a", "nmae": "b"})).unwrap_err();
        assert_eq!(field_of(err), "nmae");
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(field_of(SCHEMA.validate(&json!(["a"])).unwrap_err()), "options");
    }
}
