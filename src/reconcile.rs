//! Ingredient reconciliation.
//!
//! The HashiCups API only offers "create or replace ingredient by name", so
//! converging a coffee from its previous ingredient list to the desired one
//! means computing a list of upserts:
//!
//! 1. every previous ingredient is upserted, with the desired values when the
//!    desired list still names it and with quantity `0` (removal) otherwise;
//! 2. every desired ingredient not already handled by step 1 is upserted.
//!
//! Ingredients are matched by exact name and only the first occurrence of a
//! name in either list takes part in matching.
//!
//! # Example
//!
//! ```
//! use hashicups_provider::model::IngredientState;
//! use hashicups_provider::reconcile::{reconcile, UpsertOperation};
//!
//! let previous = vec![
//!     IngredientState::new("Espresso", 50.0, "ml"),
//!     IngredientState::new("Steamed Milk", 100.0, "ml"),
//! ];
//! let desired = vec![IngredientState::new("Pumpkin Spice", 1.0, "ml")];
//!
//! assert_eq!(
//!     reconcile(&previous, &desired),
//!     vec![
//!         UpsertOperation::new("Espresso", 0.0, "ml"),
//!         UpsertOperation::new("Steamed Milk", 0.0, "ml"),
//!         UpsertOperation::new("Pumpkin Spice", 1.0, "ml"),
//!     ]
//! );
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::CoffeeIngredientRequest;
use crate::model::IngredientState;

/// Quantity that tells the API to drop an ingredient.
pub const REMOVAL_QUANTITY: f64 = 0.0;

/// A directive to create or replace one named ingredient remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertOperation {
    /// Ingredient name.
    pub name: String,
    /// Quantity to send; [`REMOVAL_QUANTITY`] removes the ingredient.
    pub quantity: f64,
    /// Unit of measure label.
    pub unit: String,
}

impl UpsertOperation {
    /// Create an operation.
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Upsert `ingredient` with its own values.
    pub fn upsert(ingredient: &IngredientState) -> Self {
        Self::new(&ingredient.name, ingredient.quantity, &ingredient.unit)
    }

    /// Remove `ingredient`, keeping its unit.
    pub fn removal(ingredient: &IngredientState) -> Self {
        Self::new(&ingredient.name, REMOVAL_QUANTITY, &ingredient.unit)
    }

    /// Whether this operation removes the ingredient once sent.
    pub fn is_removal(&self) -> bool {
        wire_quantity(self.quantity) == 0
    }

    /// Request body for the ingredient endpoint of `coffee_id`.
    ///
    /// The API counts whole units, so the quantity is truncated.
    pub fn to_request(&self, coffee_id: i64) -> CoffeeIngredientRequest {
        CoffeeIngredientRequest {
            coffee_id,
            ingredient_id: 0,
            name: self.name.clone(),
            quantity: wire_quantity(self.quantity),
            unit: self.unit.clone(),
        }
    }
}

/// Quantity as sent to the API, which counts whole units.
///
/// Anything that truncates to `0` removes the ingredient remotely.
pub fn wire_quantity(quantity: f64) -> i64 {
    quantity as i64
}

/// When a desired ingredient counts as already handled by the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlreadyHandled {
    /// Whenever the previous list names it.
    #[default]
    AnyIndex,
    /// Only when the first previous match is not at index 0.
    ///
    /// A desired ingredient matching the head of the previous list is upserted
    /// a second time in the second pass. Kept for state compatibility with
    /// older provider releases.
    NonZeroIndexOnly,
}

impl AlreadyHandled {
    fn covers(self, previous_index: usize) -> bool {
        match self {
            Self::AnyIndex => true,
            Self::NonZeroIndexOnly => previous_index > 0,
        }
    }
}

/// Count of operations by kind, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationSummary {
    /// Upserts of ingredients present in both lists.
    pub updated: usize,
    /// Upserts with [`REMOVAL_QUANTITY`].
    pub removed: usize,
    /// Upserts of ingredients only the desired list names.
    pub added: usize,
}

/// Compute the upserts that turn `previous` into `desired`, with
/// [`AlreadyHandled::AnyIndex`].
pub fn reconcile(previous: &[IngredientState], desired: &[IngredientState]) -> Vec<UpsertOperation> {
    reconcile_with(previous, desired, AlreadyHandled::default())
}

/// Compute the upserts that turn `previous` into `desired`.
///
/// Operations for the previous list come first, in its order, followed by the
/// additions in desired order. Never fails; either list may be empty.
pub fn reconcile_with(
    previous: &[IngredientState],
    desired: &[IngredientState],
    handled: AlreadyHandled,
) -> Vec<UpsertOperation> {
    reconcile_summarized(previous, desired, handled).0
}

/// Like [`reconcile_with`], also counting operations by kind.
pub fn reconcile_summarized(
    previous: &[IngredientState],
    desired: &[IngredientState],
    handled: AlreadyHandled,
) -> (Vec<UpsertOperation>, OperationSummary) {
    let desired_by_name = first_index_by_name(desired);
    let previous_by_name = first_index_by_name(previous);

    let mut operations = Vec::with_capacity(previous.len() + desired.len());
    let mut summary = OperationSummary::default();

    for ingredient in previous {
        match desired_by_name.get(ingredient.name.as_str()) {
            Some(&i) => {
                operations.push(UpsertOperation::upsert(&desired[i]));
                summary.updated += 1;
            },
            None => {
                operations.push(UpsertOperation::removal(ingredient));
                summary.removed += 1;
            },
        }
    }

    for ingredient in desired {
        if let Some(&i) = previous_by_name.get(ingredient.name.as_str()) {
            if handled.covers(i) {
                continue;
            }
        }
        operations.push(UpsertOperation::upsert(ingredient));
        summary.added += 1;
    }

    (operations, summary)
}

fn first_index_by_name(ingredients: &[IngredientState]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(ingredients.len());
    for (i, ingredient) in ingredients.iter().enumerate() {
        index.entry(ingredient.name.as_str()).or_insert(i);
    }
    index
}
