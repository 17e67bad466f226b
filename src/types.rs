//! Result types exchanged with the host.

use serde::{Deserialize, Serialize};

/// A single planned attribute change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Path of the attribute (`price`, `ingredients`).
    pub path: String,
    /// Value before the change, absent for additions.
    pub before: Option<serde_json::Value>,
    /// Value after the change, absent for removals.
    pub after: Option<serde_json::Value>,
}

impl AttributeChange {
    /// An attribute that is being set for the first time.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            before: None,
            after: Some(value),
        }
    }

    /// An attribute that is being cleared.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            before: Some(value),
            after: None,
        }
    }

    /// An attribute whose value changes.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self {
            path: path.into(),
            before: Some(before),
            after: Some(after),
        }
    }

    /// Derive the change between two optional values, if they differ.
    ///
    /// `null` counts as absent.
    pub fn between(
        path: impl Into<String>,
        before: Option<&serde_json::Value>,
        after: Option<&serde_json::Value>,
    ) -> Option<Self> {
        let before = before.filter(|v| !v.is_null());
        let after = after.filter(|v| !v.is_null());
        match (before, after) {
            (None, None) => None,
            (None, Some(a)) => Some(Self::added(path, a.clone())),
            (Some(b), None) => Some(Self::removed(path, b.clone())),
            (Some(b), Some(a)) if b == a => None,
            (Some(b), Some(a)) => Some(Self::modified(path, b.clone(), a.clone())),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: serde_json::Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: serde_json::Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// A resource brought under management by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state, to be completed by a subsequent read.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned to the host before the full schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("teaser", json!("new"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("new")));

        let removed = AttributeChange::removed("teaser", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("price", json!(150), json!(250));
        assert_eq!(modified.before, Some(json!(150)));
        assert_eq!(modified.after, Some(json!(250)));
    }

    #[test]
    fn test_attribute_change_between() {
        assert!(AttributeChange::between("price", Some(&json!(1)), Some(&json!(1))).is_none());
        assert!(AttributeChange::between("image", None, Some(&json!(null))).is_none());

        let change = AttributeChange::between("price", Some(&json!(150)), Some(&json!(250)));
        assert_eq!(
            change,
            Some(AttributeChange::modified("price", json!(150), json!(250)))
        );

        let change = AttributeChange::between("teaser", Some(&json!("x")), None);
        assert_eq!(change, Some(AttributeChange::removed("teaser", json!("x"))));
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "1"}));
        assert!(no_change.changes.is_empty());
        assert!(!no_change.requires_replace);

        let with_changes = PlanResult::with_changes(
            json!({"id": "1", "price": 250}),
            vec![AttributeChange::modified("price", json!(150), json!(250))],
            false,
        );
        assert_eq!(with_changes.changes.len(), 1);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("hashicups_coffee", json!({"id": "7"}));
        assert_eq!(imported.resource_type, "hashicups_coffee");
        assert_eq!(imported.state["id"], "7");
    }
}
