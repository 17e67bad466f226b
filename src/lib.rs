//! HashiCups Provider
//!
//! A provider for the HashiCups demo API managing a single resource type,
//! `hashicups_coffee`: a coffee with scalar attributes and an ordered list of
//! ingredients.
//!
//! # Overview
//!
//! - **Ingredient reconciliation**: [`reconcile()`] turns the prior and desired
//!   ingredient lists into the upsert calls that make the remote match
//! - **Remote sync**: [`sync::sync_ingredients`] applies those calls in order and
//!   records assigned ingredient ids
//! - **Client**: [`client::Client`] speaks JSON over HTTP to the HashiCups API
//! - **ProviderService trait**: the lifecycle contract a host drives
//! - **Schema & validation**: typed schema description and JSON validation
//! - **Error types**: [`ProviderError`] and its mapping onto diagnostics
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use hashicups_provider::{HashiCupsProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hashicups_provider::init_logging();
//!
//!     let provider = HashiCupsProvider::new();
//!     provider.configure(json!({"host": "http://localhost:19090"})).await?;
//!
//!     let planned = json!({
//!         "name": "terraspiced latte",
//!         "price": 150,
//!         "ingredients": [
//!             {"name": "Espresso", "quantity": 50, "unit": "ml"},
//!             {"name": "Steamed Milk", "quantity": 100, "unit": "ml"}
//!         ]
//!     });
//!     let plan = provider
//!         .plan("hashicups_coffee", None, planned.clone(), planned)
//!         .await?;
//!     let state = provider.create("hashicups_coffee", plan.planned_state).await?;
//!     println!("{}", state["id"]);
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle
//!
//! The host calls, per resource instance:
//!
//! - **ValidateProviderConfig / Configure**: once, before anything else
//! - **ValidateResourceConfig**: checks configuration against the schema
//! - **Plan**: computes the planned state and the attributes that change
//! - **Create/Read/Update/Delete**: CRUD operations against the API
//! - **ImportResource**: starts managing an existing coffee by id

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod coffee;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod schema;
pub mod service;
pub mod sync;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use model::{CoffeeState, IngredientState};
pub use provider::HashiCupsProvider;
pub use reconcile::{reconcile, reconcile_with, AlreadyHandled, UpsertOperation};
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
