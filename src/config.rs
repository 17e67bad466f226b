//! Provider configuration.
//!
//! The host passes the `provider "hashicups" { ... }` block as JSON. Unset
//! values fall back to the environment and then to defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_TIMEOUT;
use crate::error::ProviderError;
use crate::reconcile::AlreadyHandled;
use crate::schema::{Attribute, Schema};

/// Environment variable consulted when `host` is not configured.
pub const HOST_ENV: &str = "HASHICUPS_HOST";

/// Host used when neither configuration nor environment name one.
pub const DEFAULT_HOST: &str = "http://localhost:19090";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<i64>,
    #[serde(default)]
    legacy_ingredient_matching: Option<bool>,
}

/// Resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the HashiCups API.
    pub host: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// How reconciliation decides that a desired ingredient was already upserted.
    pub already_handled: AlreadyHandled,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            already_handled: AlreadyHandled::default(),
        }
    }
}

impl ProviderConfig {
    /// Resolve configuration from the host's JSON, reading [`HOST_ENV`].
    pub fn from_value(config: serde_json::Value) -> Result<Self, ProviderError> {
        Self::resolve(config, std::env::var(HOST_ENV).ok())
    }

    /// Resolve configuration with an explicit environment fallback for `host`.
    pub fn resolve(
        config: serde_json::Value,
        env_host: Option<String>,
    ) -> Result<Self, ProviderError> {
        let raw: RawConfig = if config.is_null() {
            RawConfig::default()
        } else {
            serde_json::from_value(config)
                .map_err(|e| ProviderError::Configuration(e.to_string()))?
        };

        let host = raw
            .host
            .or(env_host)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ProviderError::Configuration(format!(
                "host '{}' must start with http:// or https://",
                host
            )));
        }

        let request_timeout = match raw.request_timeout_secs {
            None => DEFAULT_TIMEOUT,
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            Some(secs) => {
                return Err(ProviderError::Configuration(format!(
                    "request_timeout_secs must be positive, got {}",
                    secs
                )))
            },
        };

        let already_handled = if raw.legacy_ingredient_matching.unwrap_or(false) {
            AlreadyHandled::NonZeroIndexOnly
        } else {
            AlreadyHandled::AnyIndex
        };

        Ok(Self {
            host,
            request_timeout,
            already_handled,
        })
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Interact with the HashiCups demo API.")
            .with_attribute(
                "host",
                Attribute::optional_string().with_description(format!(
                    "URI of the HashiCups API. May also be set with {}.",
                    HOST_ENV
                )),
            )
            .with_attribute(
                "request_timeout_secs",
                Attribute::optional_int64().with_description("Per-request timeout in seconds."),
            )
            .with_attribute(
                "legacy_ingredient_matching",
                Attribute::optional_bool().with_description(
                    "Re-send an ingredient that heads the prior ingredient list, as older \
                     releases did.",
                ),
            )
    }
}
