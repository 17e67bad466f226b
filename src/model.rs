//! Persisted state of a `hashicups_coffee` resource.
//!
//! These are the shapes the host stores between operations; they convert to and
//! from `serde_json::Value` at the [`crate::ProviderService`] boundary and to
//! and from the wire types in [`crate::client`].

use serde::{Deserialize, Serialize};

use crate::client;
use crate::error::ProviderError;

/// One ingredient of a coffee recipe, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IngredientState {
    /// Remote identifier, absent until the ingredient exists remotely.
    #[serde(default)]
    pub ingredient_id: Option<i64>,
    /// Reconciliation key; compared exactly, case included.
    #[serde(default)]
    pub name: String,
    /// Amount in `unit`.
    pub quantity: f64,
    /// Unit of measure label.
    pub unit: String,
}

impl IngredientState {
    /// An ingredient that has not been created remotely yet.
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            ingredient_id: None,
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Attach a remote identifier.
    pub fn with_id(mut self, ingredient_id: i64) -> Self {
        self.ingredient_id = Some(ingredient_id);
        self
    }
}

impl From<client::Ingredient> for IngredientState {
    fn from(ingredient: client::Ingredient) -> Self {
        Self {
            ingredient_id: Some(ingredient.id),
            name: ingredient.name,
            quantity: ingredient.quantity as f64,
            unit: ingredient.unit,
        }
    }
}

/// State of one coffee and its ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CoffeeState {
    /// Numeric identifier of the coffee, rendered as a string.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Short teaser text.
    #[serde(default)]
    pub teaser: Option<String>,
    /// Collection the coffee belongs to.
    #[serde(default)]
    pub collection: Option<String>,
    /// Origin or release season.
    #[serde(default)]
    pub origin: Option<String>,
    /// Color code.
    #[serde(default)]
    pub color: Option<String>,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Price in USD.
    #[serde(default)]
    pub price: i64,
    /// Image path or URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Ingredients in recipe order.
    #[serde(default)]
    pub ingredients: Vec<IngredientState>,
}

impl CoffeeState {
    /// Decode a state or plan object handed over by the host.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode for the host.
    pub fn to_value(&self) -> Result<serde_json::Value, ProviderError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The numeric coffee id, required for every operation after create.
    pub fn coffee_id(&self) -> Result<i64, ProviderError> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| ProviderError::InvalidRequest("coffee state has no id".to_string()))?;
        parse_coffee_id(id)
    }

    /// Take the scalar attributes of a coffee fetched from the API.
    pub fn refresh_from(&mut self, remote: &client::Coffee) {
        self.id = Some(remote.id.to_string());
        self.name = remote.name.clone();
        self.teaser = non_empty(&remote.teaser);
        self.collection = non_empty(&remote.collection);
        self.origin = non_empty(&remote.origin);
        self.color = non_empty(&remote.color);
        self.description = non_empty(&remote.description);
        self.price = remote.price as i64;
        self.image = non_empty(&remote.image);
    }

    /// The scalar attributes as sent to the API.
    pub fn to_remote(&self, id: i64) -> client::Coffee {
        client::Coffee {
            id,
            name: self.name.clone(),
            teaser: self.teaser.clone().unwrap_or_default(),
            collection: self.collection.clone().unwrap_or_default(),
            origin: self.origin.clone().unwrap_or_default(),
            color: self.color.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            price: self.price as f64,
            image: self.image.clone().unwrap_or_default(),
            ingredients: Vec::new(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a coffee id as stored in state or given to import.
pub fn parse_coffee_id(id: &str) -> Result<i64, ProviderError> {
    id.trim()
        .parse()
        .map_err(|_| ProviderError::Validation(format!("coffee id '{}' is not numeric", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coffee_state_from_plan() {
        let state = CoffeeState::from_value(json!({
            "name": "terraspiced latte",
            "teaser": "exclusively for techdays 2025",
            "price": 150,
            "image": "/terraform.png",
            "ingredients": [
                {"name": "Espresso", "quantity": 50, "unit": "ml"},
                {"name": "Steamed Milk", "quantity": 100, "unit": "ml", "ingredient_id": 4}
            ]
        }))
        .unwrap();

        assert!(state.id.is_none());
        assert_eq!(state.price, 150);
        assert!(state.collection.is_none());
        assert_eq!(state.ingredients[0], IngredientState::new("Espresso", 50.0, "ml"));
        assert_eq!(state.ingredients[1].ingredient_id, Some(4));
    }

    #[test]
    fn test_coffee_state_round_trips_through_value() {
        let state = CoffeeState {
            id: Some("3".to_string()),
            name: "random_mix".to_string(),
            price: -1,
            ingredients: vec![IngredientState::new("Hot Water", 1.0, "l").with_id(9)],
            ..Default::default()
        };
        let value = state.to_value().unwrap();
        assert_eq!(value["ingredients"][0]["ingredient_id"], 9);
        assert_eq!(CoffeeState::from_value(value).unwrap(), state);
    }

    #[test]
    fn test_coffee_id() {
        let mut state = CoffeeState::default();
        assert!(matches!(
            state.coffee_id(),
            Err(ProviderError::InvalidRequest(_))
        ));

        state.id = Some("17".to_string());
        assert_eq!(state.coffee_id().unwrap(), 17);

        state.id = Some("latte".to_string());
        assert!(matches!(state.coffee_id(), Err(ProviderError::Validation(_))));
    }

    #[test]
    fn test_to_remote_fills_empty_strings() {
        let state = CoffeeState {
            name: "it's october I guess".to_string(),
            teaser: Some("exclusively for techdays 2025".to_string()),
            price: 250,
            ..Default::default()
        };
        let remote = state.to_remote(8);
        assert_eq!(remote.id, 8);
        assert_eq!(remote.price, 250.0);
        assert_eq!(remote.teaser, "exclusively for techdays 2025");
        assert!(remote.origin.is_empty());
    }

    #[test]
    fn test_refresh_from_remote() {
        let mut state = CoffeeState {
            id: Some("5".to_string()),
            teaser: Some("stale".to_string()),
            ..Default::default()
        };
        state.refresh_from(&client::Coffee {
            id: 5,
            name: "Vagrante espresso".to_string(),
            origin: "Summer 2014".to_string(),
            price: 200.0,
            ..Default::default()
        });

        assert_eq!(state.name, "Vagrante espresso");
        assert_eq!(state.price, 200);
        assert_eq!(state.origin.as_deref(), Some("Summer 2014"));
        assert!(state.teaser.is_none());
    }

    #[test]
    fn test_import_state_decodes() {
        let state = CoffeeState::from_value(json!({"id": "7"})).unwrap();
        assert_eq!(state.coffee_id().unwrap(), 7);
        assert!(state.ingredients.is_empty());
    }

    #[test]
    fn test_ingredient_from_remote() {
        let ingredient: IngredientState = client::Ingredient {
            id: 2,
            name: "Espresso".to_string(),
            quantity: 40,
            unit: "ml".to_string(),
        }
        .into();
        assert_eq!(ingredient, IngredientState::new("Espresso", 40.0, "ml").with_id(2));
    }
}
