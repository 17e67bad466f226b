//! Applies reconciled ingredient operations to the HashiCups API.
//!
//! Calls are issued one at a time in operation order. After each call the
//! returned identifier is written into the first desired ingredient with the
//! same name. The first failing call ends the run; earlier upserts stay applied
//! remotely, and the caller must not persist the desired list in that case.

use tracing::{debug, instrument, warn};

use crate::client::{HashiCupsApi, Ingredient};
use crate::error::ProviderError;
use crate::model::IngredientState;
use crate::reconcile::UpsertOperation;

/// Upsert every operation against `coffee_id`, filling in `desired` ids.
///
/// Returns the ingredients echoed by the API, one per operation.
#[instrument(skip(api, operations, desired), fields(operations = operations.len()))]
pub async fn sync_ingredients<A>(
    api: &A,
    coffee_id: i64,
    operations: &[UpsertOperation],
    desired: &mut [IngredientState],
) -> Result<Vec<Ingredient>, ProviderError>
where
    A: HashiCupsApi + ?Sized,
{
    let mut applied = Vec::with_capacity(operations.len());

    for (position, operation) in operations.iter().enumerate() {
        let ingredient = api
            .create_coffee_ingredient(coffee_id, &operation.to_request(coffee_id))
            .await
            .inspect_err(|e| {
                warn!(
                    error = %e,
                    ingredient = %operation.name,
                    applied = position,
                    remaining = operations.len() - position,
                    "Ingredient upsert failed, remote coffee may be partially updated"
                );
            })?;

        debug!(
            ingredient = %ingredient.name,
            id = ingredient.id,
            quantity = ingredient.quantity,
            removal = operation.is_removal(),
            "Ingredient upserted"
        );

        match desired.iter_mut().find(|d| d.name == ingredient.name) {
            Some(entry) => entry.ingredient_id = Some(ingredient.id),
            // Removed ingredients are not part of the desired list.
            None => debug!(ingredient = %ingredient.name, "No desired ingredient to update"),
        }

        applied.push(ingredient);
    }

    Ok(applied)
}
