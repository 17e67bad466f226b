//! The `hashicups_coffee` resource.
//!
//! Coffee scalars map one-to-one onto the coffee endpoints. Ingredients are
//! converged through [`crate::reconcile`] and [`crate::sync`]: create treats
//! the prior list as empty, update diffs prior state against the plan.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::client::HashiCupsApi;
use crate::error::ProviderError;
use crate::model::{parse_coffee_id, CoffeeState, IngredientState};
use crate::reconcile::{reconcile_summarized, wire_quantity, AlreadyHandled};
use crate::schema::{Attribute, Block, Diagnostic, NestedList, Schema};
use crate::sync::sync_ingredients;
use crate::types::{AttributeChange, ImportedResource, PlanResult};

/// Type name of the resource.
pub const RESOURCE_TYPE: &str = "hashicups_coffee";

/// Top-level attributes compared while planning, in schema order.
const PLANNED_ATTRIBUTES: &[&str] = &[
    "name",
    "teaser",
    "collection",
    "origin",
    "color",
    "description",
    "price",
    "image",
    "ingredients",
];

/// Schema of the coffee resource.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manages a coffee.")
        .with_attribute(
            "id",
            Attribute::computed_string()
                .with_description("Numeric identifier of the coffee.")
                .with_use_state_for_unknown(),
        )
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of the coffee."),
        )
        .with_attribute(
            "teaser",
            Attribute::optional_string().with_description("Short teaser text for the coffee."),
        )
        .with_attribute(
            "collection",
            Attribute::optional_string().with_description("Collection the coffee belongs to."),
        )
        .with_attribute(
            "origin",
            Attribute::optional_string()
                .with_description("Origin or release season of the coffee."),
        )
        .with_attribute(
            "color",
            Attribute::optional_string().with_description("Color code associated with the coffee."),
        )
        .with_attribute(
            "description",
            Attribute::optional_string().with_description("Detailed description of the coffee."),
        )
        .with_attribute(
            "price",
            Attribute::required_int64().with_description("Price of the coffee in USD."),
        )
        .with_attribute(
            "image",
            Attribute::optional_string().with_description("URL or path to the coffee image."),
        )
        .with_list(
            "ingredients",
            NestedList::optional(
                Block::new()
                    .with_description("List of ingredients in the coffee.")
                    .with_attribute(
                        "ingredient_id",
                        Attribute::computed_int64()
                            .with_description("Identifier of the ingredient."),
                    )
                    .with_attribute(
                        "name",
                        Attribute::optional_string().with_description("Name of the ingredient."),
                    )
                    .with_attribute(
                        "quantity",
                        Attribute::required_float64()
                            .with_description("Quantity of the ingredient."),
                    )
                    .with_attribute(
                        "unit",
                        Attribute::required_string()
                            .with_description("Unit of measurement for the ingredient."),
                    ),
            ),
        )
}

/// Errors for ingredients whose quantity the API would read as a removal.
pub fn quantity_diagnostics(ingredients: &[IngredientState]) -> Vec<Diagnostic> {
    ingredients
        .iter()
        .enumerate()
        .filter(|(_, ingredient)| wire_quantity(ingredient.quantity) == 0)
        .map(|(index, ingredient)| {
            Diagnostic::error(format!("Invalid quantity for ingredient '{}'", ingredient.name))
                .with_detail(format!(
                    "Quantity {} is sent as 0, which removes the ingredient; use at least 1",
                    ingredient.quantity
                ))
                .with_attribute(format!("ingredients.{}.quantity", index))
        })
        .collect()
}

fn check_quantities(ingredients: &[IngredientState]) -> Result<(), ProviderError> {
    match ingredients
        .iter()
        .find(|ingredient| wire_quantity(ingredient.quantity) == 0)
    {
        Some(ingredient) => Err(ProviderError::Validation(format!(
            "ingredient '{}' quantity {} truncates to 0",
            ingredient.name, ingredient.quantity
        ))),
        None => Ok(()),
    }
}

/// Lifecycle operations of `hashicups_coffee` against one API.
pub struct CoffeeResource {
    api: Arc<dyn HashiCupsApi>,
    already_handled: AlreadyHandled,
}

impl CoffeeResource {
    /// Create the resource on top of `api`.
    pub fn new(api: Arc<dyn HashiCupsApi>, already_handled: AlreadyHandled) -> Self {
        Self {
            api,
            already_handled,
        }
    }

    /// Plan a create (`prior` absent), an update, or a delete (`proposed` absent).
    pub fn plan(
        &self,
        prior: Option<&CoffeeState>,
        proposed: Option<CoffeeState>,
    ) -> Result<PlanResult, ProviderError> {
        let prior_value = prior.map(CoffeeState::to_value).transpose()?;

        let Some(mut planned) = proposed else {
            let changes = prior_value
                .as_ref()
                .map(|before| attribute_changes(Some(before), None))
                .unwrap_or_default();
            return Ok(PlanResult::with_changes(
                serde_json::Value::Null,
                changes,
                false,
            ));
        };

        check_quantities(&planned.ingredients)?;
        if let Some(prior) = prior {
            planned.id = prior.id.clone();
            carry_ingredient_ids(&prior.ingredients, &mut planned.ingredients);
        }

        let planned_value = planned.to_value()?;
        let changes = attribute_changes(prior_value.as_ref(), Some(&planned_value));
        Ok(PlanResult::with_changes(planned_value, changes, false))
    }

    /// Create the coffee, then upsert every planned ingredient.
    #[instrument(skip(self, planned), fields(name = %planned.name))]
    pub async fn create(&self, mut planned: CoffeeState) -> Result<CoffeeState, ProviderError> {
        check_quantities(&planned.ingredients)?;
        let created = self.api.create_coffee(&planned.to_remote(0)).await?;
        info!(coffee_id = created.id, "Coffee created");

        self.converge_ingredients(created.id, &[], &mut planned.ingredients)
            .await?;

        planned.id = Some(created.id.to_string());
        Ok(planned)
    }

    /// Refresh the state from the API.
    ///
    /// Ingredients whose remote quantity is zero were removed and are dropped.
    #[instrument(skip(self, state), fields(id = ?state.id))]
    pub async fn read(&self, mut state: CoffeeState) -> Result<CoffeeState, ProviderError> {
        let coffee_id = state.coffee_id()?;
        let coffee = self.api.get_coffee(coffee_id).await?;
        let ingredients = self.api.get_coffee_ingredients(coffee_id).await?;

        state.refresh_from(&coffee);
        state.ingredients = ingredients
            .into_iter()
            .filter(|i| i.quantity != 0)
            .map(IngredientState::from)
            .collect();

        debug!(ingredients = state.ingredients.len(), "Coffee read");
        Ok(state)
    }

    /// Update the coffee scalars, then converge ingredients from `prior` to `planned`.
    #[instrument(skip(self, prior, planned), fields(id = ?prior.id))]
    pub async fn update(
        &self,
        prior: CoffeeState,
        mut planned: CoffeeState,
    ) -> Result<CoffeeState, ProviderError> {
        check_quantities(&planned.ingredients)?;
        let coffee_id = match planned.id {
            Some(_) => planned.coffee_id()?,
            None => prior.coffee_id()?,
        };

        let updated = self.api.update_coffee(&planned.to_remote(coffee_id)).await?;
        info!(coffee_id, name = %updated.name, "Coffee updated");

        self.converge_ingredients(coffee_id, &prior.ingredients, &mut planned.ingredients)
            .await?;

        planned.id = Some(coffee_id.to_string());
        Ok(planned)
    }

    /// Delete the coffee.
    #[instrument(skip(self, state), fields(id = ?state.id))]
    pub async fn delete(&self, state: CoffeeState) -> Result<(), ProviderError> {
        let coffee_id = state.coffee_id()?;
        self.api.delete_coffee(coffee_id).await?;
        info!(coffee_id, "Coffee deleted");
        Ok(())
    }

    /// Start managing an existing coffee; the host follows up with a read.
    pub fn import(&self, id: &str) -> Result<ImportedResource, ProviderError> {
        let coffee_id = parse_coffee_id(id)?;
        let state = CoffeeState {
            id: Some(coffee_id.to_string()),
            ..Default::default()
        };
        Ok(ImportedResource::new(RESOURCE_TYPE, state.to_value()?))
    }

    async fn converge_ingredients(
        &self,
        coffee_id: i64,
        previous: &[IngredientState],
        desired: &mut [IngredientState],
    ) -> Result<(), ProviderError> {
        let (operations, summary) = reconcile_summarized(previous, desired, self.already_handled);
        debug!(
            coffee_id,
            updated = summary.updated,
            removed = summary.removed,
            added = summary.added,
            "Ingredient operations"
        );

        sync_ingredients(self.api.as_ref(), coffee_id, &operations, desired).await?;
        Ok(())
    }
}

/// Keep known ingredient ids for ingredients the plan still names.
fn carry_ingredient_ids(prior: &[IngredientState], planned: &mut [IngredientState]) {
    for ingredient in planned.iter_mut().filter(|i| i.ingredient_id.is_none()) {
        ingredient.ingredient_id = prior
            .iter()
            .find(|p| p.name == ingredient.name)
            .and_then(|p| p.ingredient_id);
    }
}

fn attribute_changes(
    before: Option<&serde_json::Value>,
    after: Option<&serde_json::Value>,
) -> Vec<AttributeChange> {
    PLANNED_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            AttributeChange::between(
                *name,
                before.and_then(|v| v.get(name)),
                after.and_then(|v| v.get(name)),
            )
        })
        .collect()
}
