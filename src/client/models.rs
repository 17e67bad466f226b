//! Wire types of the HashiCups API.

use serde::{Deserialize, Serialize};

/// A coffee as returned by `/coffees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Coffee {
    /// Server-assigned identifier; `0` when creating.
    #[serde(default)]
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Short teaser text.
    #[serde(default)]
    pub teaser: String,
    /// Collection the coffee belongs to.
    #[serde(default)]
    pub collection: String,
    /// Origin or release season.
    #[serde(default)]
    pub origin: String,
    /// Color code.
    #[serde(default)]
    pub color: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Price in USD.
    #[serde(default)]
    pub price: f64,
    /// Image path or URL.
    #[serde(default)]
    pub image: String,
    /// References to the coffee's ingredients.
    #[serde(default)]
    pub ingredients: Vec<IngredientRef>,
}

/// Reference from a coffee to one of its ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngredientRef {
    /// Identifier of the referenced ingredient.
    #[serde(rename = "ingredient_id")]
    pub id: i64,
}

/// An ingredient of a coffee as returned by `/coffees/{id}/ingredients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ingredient {
    /// Server-assigned identifier.
    #[serde(default)]
    pub id: i64,
    /// Ingredient name, unique within a coffee.
    pub name: String,
    /// Amount in `unit`.
    #[serde(default)]
    pub quantity: i64,
    /// Unit of measure label.
    #[serde(default)]
    pub unit: String,
}

/// Body of `POST /coffees/{id}/ingredients`.
///
/// The server upserts by `name` within the coffee; a `quantity` of `0`
/// removes the ingredient from the recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffeeIngredientRequest {
    /// Coffee the ingredient belongs to.
    pub coffee_id: i64,
    /// Known ingredient identifier, `0` to let the server resolve it by name.
    pub ingredient_id: i64,
    /// Ingredient name.
    pub name: String,
    /// Amount in `unit`; `0` removes the ingredient.
    pub quantity: i64,
    /// Unit of measure label.
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coffee_decodes_partial_payload() {
        let coffee: Coffee = serde_json::from_value(json!({
            "id": 3,
            "name": "Nomadicano",
            "price": 150,
            "ingredients": [{"ingredient_id": 1}, {"ingredient_id": 2}]
        }))
        .unwrap();

        assert_eq!(coffee.id, 3);
        assert_eq!(coffee.price, 150.0);
        assert!(coffee.teaser.is_empty());
        assert_eq!(
            coffee.ingredients,
            vec![IngredientRef { id: 1 }, IngredientRef { id: 2 }]
        );
    }

    #[test]
    fn test_ingredient_request_field_names() {
        let request = CoffeeIngredientRequest {
            coffee_id: 3,
            ingredient_id: 0,
            name: "Espresso".to_string(),
            quantity: 40,
            unit: "ml".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "coffee_id": 3,
                "ingredient_id": 0,
                "name": "Espresso",
                "quantity": 40,
                "unit": "ml"
            })
        );
    }
}
