//! Schema validation of JSON configuration.
//!
//! Walks a `serde_json::Value` against a [`Schema`] and reports every problem as
//! a [`Diagnostic`] carrying the attribute path (`ingredients.1.unit`).
//!
//! # Example
//!
//! ```
//! use hashicups_provider::schema::{Attribute, Schema};
//! use hashicups_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("price", Attribute::required_int64());
//!
//! assert!(validate(&schema, &json!({"name": "latte", "price": 150})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "latte", "price": "cheap"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("price".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedList, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Required attributes must be present and non-null, computed-only attributes
/// are skipped, types must match and nested lists respect their item bounds.
/// An empty result means the value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], but returns `Err` with the diagnostics when invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        // Null stands for an absent block; nothing further to check.
        Value::Null => return,
        _ => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, list) in &block.lists {
        let list_path = join_path(path, name);
        validate_list(list, obj.get(name), &list_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            if !matches_type(attr.attr_type, v) {
                diagnostics.push(type_error(path, attr.attr_type, v));
            }
        },
    }
}

fn validate_list(
    list: &NestedList,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items = match value {
        None | Some(Value::Null) => {
            if !list.optional || list.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "List '{}' requires at least {} item(s)",
                        path,
                        list.min_items.max(1)
                    ))
                    .with_attribute(path),
                );
            }
            return;
        },
        Some(Value::Array(items)) => items,
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for '{}'", path))
                    .with_detail(format!("Got {}", type_name(v)))
                    .with_attribute(path),
            );
            return;
        },
    };

    let len = items.len() as u32;
    if len < list.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "List '{}' requires at least {} item(s), got {}",
                path, list.min_items, len
            ))
            .with_attribute(path),
        );
    }
    if list.max_items > 0 && len > list.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "List '{}' allows at most {} item(s), got {}",
                path, list.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}.{}", path, i);
        validate_block(&list.block, item, &item_path, diagnostics);
    }
}

fn matches_type(attr_type: AttributeType, value: &Value) -> bool {
    match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Bool => value.is_boolean(),
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => true,
        // 150.0 is still a whole price
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64),
        _ => false,
    }
}

fn type_error(path: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected.name(), type_name(got)))
        .with_attribute(path)
}
