//! Testing utilities.
//!
//! [`ProviderTester`] drives a [`ProviderService`] through host-style lifecycle
//! sequences, and [`InMemoryHashiCups`] stands in for the HashiCups API so the
//! provider can be exercised without a server.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hashicups_provider::testing::{InMemoryHashiCups, ProviderTester};
//! use hashicups_provider::HashiCupsProvider;
//! use serde_json::json;
//!
//! let api = Arc::new(InMemoryHashiCups::new());
//! let tester = ProviderTester::new(HashiCupsProvider::with_api(api.clone()));
//! tester.configure(json!({})).await.unwrap();
//!
//! let state = tester
//!     .lifecycle_create("hashicups_coffee", json!({"name": "latte", "price": 150}))
//!     .await
//!     .unwrap();
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::client::{Coffee, CoffeeIngredientRequest, HashiCupsApi, Ingredient, IngredientRef};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate provider configuration; error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider; error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration; error diagnostics become `Err`.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Plan → create → read. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan → update → read. Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    /// Plan → delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create → update → delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// In-memory HashiCups
// =========================================================================

#[derive(Debug, Default)]
struct Store {
    last_coffee_id: i64,
    last_ingredient_id: i64,
    coffees: BTreeMap<i64, Coffee>,
    ingredients: BTreeMap<i64, Vec<Ingredient>>,
    calls: Vec<CoffeeIngredientRequest>,
    failing: HashSet<String>,
}

impl Store {
    fn missing_coffee(coffee_id: i64) -> ProviderError {
        ProviderError::Api {
            status: 404,
            body: format!("coffee {} not found", coffee_id),
        }
    }

    fn sync_refs(&mut self, coffee_id: i64) {
        let refs = self
            .ingredients
            .get(&coffee_id)
            .map(|list| list.iter().map(|i| IngredientRef { id: i.id }).collect())
            .unwrap_or_default();
        if let Some(coffee) = self.coffees.get_mut(&coffee_id) {
            coffee.ingredients = refs;
        }
    }
}

/// An in-memory [`HashiCupsApi`].
///
/// Ingredients are upserted by name within a coffee and a quantity of `0`
/// removes them. Every ingredient call is recorded, including failed ones.
#[derive(Debug, Default)]
pub struct InMemoryHashiCups {
    store: Mutex<Store>,
}

impl InMemoryHashiCups {
    /// Create an empty API.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a coffee without ingredients and return its id.
    pub fn seed_coffee(&self, name: &str) -> i64 {
        let mut store = self.store();
        store.last_coffee_id += 1;
        let id = store.last_coffee_id;
        store.coffees.insert(
            id,
            Coffee {
                id,
                name: name.to_string(),
                ..Default::default()
            },
        );
        id
    }

    /// Add an ingredient directly, bypassing upsert semantics.
    pub fn insert_ingredient(&self, coffee_id: i64, name: &str, quantity: i64, unit: &str) -> i64 {
        let mut store = self.store();
        store.last_ingredient_id += 1;
        let id = store.last_ingredient_id;
        store.ingredients.entry(coffee_id).or_default().push(Ingredient {
            id,
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        });
        store.sync_refs(coffee_id);
        id
    }

    /// Make every ingredient upsert for `name` fail with a server error.
    pub fn fail_ingredient(&self, name: &str) {
        self.store().failing.insert(name.to_string());
    }

    /// Current coffee, if it exists.
    pub fn coffee(&self, coffee_id: i64) -> Option<Coffee> {
        self.store().coffees.get(&coffee_id).cloned()
    }

    /// Current ingredients of a coffee.
    pub fn ingredients(&self, coffee_id: i64) -> Vec<Ingredient> {
        self.store()
            .ingredients
            .get(&coffee_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every ingredient request received so far, in order.
    pub fn calls(&self) -> Vec<CoffeeIngredientRequest> {
        self.store().calls.clone()
    }
}

#[async_trait::async_trait]
impl HashiCupsApi for InMemoryHashiCups {
    async fn get_coffees(&self) -> Result<Vec<Coffee>, ProviderError> {
        Ok(self.store().coffees.values().cloned().collect())
    }

    async fn get_coffee(&self, coffee_id: i64) -> Result<Coffee, ProviderError> {
        self.coffee(coffee_id)
            .ok_or_else(|| ProviderError::NotFound(format!("coffee {}", coffee_id)))
    }

    async fn get_coffee_ingredients(
        &self,
        coffee_id: i64,
    ) -> Result<Vec<Ingredient>, ProviderError> {
        Ok(self.ingredients(coffee_id))
    }

    async fn create_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError> {
        let mut store = self.store();
        store.last_coffee_id += 1;
        let created = Coffee {
            id: store.last_coffee_id,
            ingredients: Vec::new(),
            ..coffee.clone()
        };
        store.coffees.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError> {
        let mut store = self.store();
        let existing = store
            .coffees
            .get_mut(&coffee.id)
            .ok_or_else(|| Store::missing_coffee(coffee.id))?;
        *existing = Coffee {
            ingredients: std::mem::take(&mut existing.ingredients),
            ..coffee.clone()
        };
        Ok(existing.clone())
    }

    async fn delete_coffee(&self, coffee_id: i64) -> Result<(), ProviderError> {
        let mut store = self.store();
        store
            .coffees
            .remove(&coffee_id)
            .ok_or_else(|| Store::missing_coffee(coffee_id))?;
        store.ingredients.remove(&coffee_id);
        Ok(())
    }

    async fn create_coffee_ingredient(
        &self,
        coffee_id: i64,
        request: &CoffeeIngredientRequest,
    ) -> Result<Ingredient, ProviderError> {
        let mut store = self.store();
        store.calls.push(request.clone());

        if store.failing.contains(&request.name) {
            return Err(ProviderError::Api {
                status: 500,
                body: format!("cannot store ingredient {}", request.name),
            });
        }
        if !store.coffees.contains_key(&coffee_id) {
            return Err(Store::missing_coffee(coffee_id));
        }

        store.last_ingredient_id += 1;
        let fresh_id = store.last_ingredient_id;
        let list = store.ingredients.entry(coffee_id).or_default();
        let position = list.iter().position(|i| i.name == request.name);

        let ingredient = match position {
            Some(p) if request.quantity == 0 => list.remove(p),
            Some(p) => {
                list[p].quantity = request.quantity;
                list[p].unit = request.unit.clone();
                list[p].clone()
            },
            None => {
                let ingredient = Ingredient {
                    id: fresh_id,
                    name: request.name.clone(),
                    quantity: request.quantity,
                    unit: request.unit.clone(),
                };
                if request.quantity != 0 {
                    list.push(ingredient.clone());
                }
                ingredient
            },
        };
        store.sync_refs(coffee_id);

        Ok(Ingredient {
            quantity: request.quantity,
            unit: request.unit.clone(),
            ..ingredient
        })
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result describes a creation.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        plan.changes.iter().all(|c| c.before.is_none()),
        "Expected only added attributes, got {:?}",
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan does not change a specific attribute path.
///
/// # Panics
///
/// Panics if the plan has a change for the given path.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));
    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}
