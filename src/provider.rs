//! The HashiCups provider.
//!
//! [`HashiCupsProvider`] implements [`ProviderService`] for the single
//! `hashicups_coffee` resource. Configuration builds the API connection; every
//! lifecycle call is dispatched to a [`CoffeeResource`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::{Client, HashiCupsApi};
use crate::coffee::{self, CoffeeResource, RESOURCE_TYPE};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::CoffeeState;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

type Connector =
    Box<dyn Fn(&ProviderConfig) -> Result<Arc<dyn HashiCupsApi>, ProviderError> + Send + Sync>;

/// Provider serving `hashicups_coffee`.
pub struct HashiCupsProvider {
    connector: Connector,
    resource: RwLock<Option<Arc<CoffeeResource>>>,
}

impl Default for HashiCupsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HashiCupsProvider {
    /// A provider that talks HTTP to the configured host.
    pub fn new() -> Self {
        Self::with_connector(|config| {
            let client = Client::with_timeout(&config.host, config.request_timeout)?;
            Ok(Arc::new(client) as Arc<dyn HashiCupsApi>)
        })
    }

    /// A provider that builds its API from the resolved configuration with `connector`.
    pub fn with_connector<F>(connector: F) -> Self
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn HashiCupsApi>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            connector: Box::new(connector),
            resource: RwLock::new(None),
        }
    }

    /// A provider that always uses `api`, whatever the configured host.
    pub fn with_api(api: Arc<dyn HashiCupsApi>) -> Self {
        Self::with_connector(move |_| Ok(api.clone()))
    }

    async fn resource(&self, resource_type: &str) -> Result<Arc<CoffeeResource>, ProviderError> {
        if resource_type != RESOURCE_TYPE {
            return Err(ProviderError::UnknownResource(resource_type.to_string()));
        }
        self.resource.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

fn optional_state(value: Option<Value>) -> Result<Option<CoffeeState>, ProviderError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => CoffeeState::from_value(value).map(Some),
    }
}

#[async_trait::async_trait]
impl ProviderService for HashiCupsProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(RESOURCE_TYPE, coffee::schema())
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&ProviderConfig::schema(), &config);
        if has_errors(&diagnostics) {
            warn!(errors = diagnostics.len(), "Rejected provider configuration");
            return Ok(diagnostics);
        }

        let resolved = match ProviderConfig::from_value(config) {
            Ok(resolved) => resolved,
            Err(e) => return Ok(vec![e.into()]),
        };
        let api = match (self.connector)(&resolved) {
            Ok(api) => api,
            Err(e) => return Ok(vec![e.into()]),
        };

        info!(
            host = %resolved.host,
            timeout_secs = resolved.request_timeout.as_secs(),
            already_handled = ?resolved.already_handled,
            "Configured HashiCups provider"
        );
        *self.resource.write().await =
            Some(Arc::new(CoffeeResource::new(api, resolved.already_handled)));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("Stopping HashiCups provider");
        self.resource.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        if resource_type != RESOURCE_TYPE {
            return Err(ProviderError::UnknownResource(resource_type.to_string()));
        }
        let mut diagnostics = validate(&coffee::schema(), &config);
        if !has_errors(&diagnostics) {
            let state = CoffeeState::from_value(config)?;
            diagnostics.extend(coffee::quantity_diagnostics(&state.ingredients));
        }
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type).await?;
        let prior = optional_state(prior_state)?;
        let proposed = optional_state(Some(proposed_state))?;
        resource.plan(prior.as_ref(), proposed)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type).await?;
        let created = resource
            .create(CoffeeState::from_value(planned_state)?)
            .await?;
        created.to_value()
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type).await?;
        let state = resource
            .read(CoffeeState::from_value(current_state)?)
            .await?;
        state.to_value()
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type).await?;
        let updated = resource
            .update(
                CoffeeState::from_value(prior_state)?,
                CoffeeState::from_value(planned_state)?,
            )
            .await?;
        updated.to_value()
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type).await?;
        resource.delete(CoffeeState::from_value(current_state)?).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type).await?;
        Ok(vec![resource.import(id)?])
    }
}
