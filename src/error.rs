//! Error types for the HashiCups provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving the coffee resource.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested coffee (or other remote object) was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred, or the provider is not configured yet.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The HashiCups API answered with a non-success status.
    #[error("HashiCups API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the server.
        body: String,
    },

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Http(_err) => "http error (see Debug output)",
            Self::Api { body, .. } => body,
            Self::InvalidRequest(msg) => msg,
            Self::Unimplemented(msg) => msg,
        }
    }

    /// Whether the error came from talking to the HashiCups API.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let summary = match &err {
            ProviderError::NotFound(_) => "Coffee not found",
            ProviderError::Validation(_) | ProviderError::InvalidRequest(_) => "Invalid input",
            ProviderError::Configuration(_) => "Invalid provider configuration",
            ProviderError::UnknownResource(_) => "Unknown resource type",
            ProviderError::Serialization(_) => "Malformed state",
            ProviderError::Http(_) | ProviderError::Api { .. } => "HashiCups API request failed",
            ProviderError::Unimplemented(_) => "Unsupported operation",
        };
        Diagnostic::error(summary).with_detail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("coffee 7".to_string());
        assert_eq!(format!("{}", err), "Resource not found: coffee 7");

        let err = ProviderError::Validation("price must be set".to_string());
        assert_eq!(format!("{}", err), "Validation error: price must be set");

        let err = ProviderError::UnknownResource("hashicups_order".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: hashicups_order");

        let err = ProviderError::Api {
            status: 500,
            body: "pq: duplicate key".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "HashiCups API returned status 500: pq: duplicate key"
        );
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("coffee 7".to_string());
        assert_eq!(err.message(), "coffee 7");

        let err = ProviderError::Configuration("missing host".to_string());
        assert_eq!(err.message(), "missing host");

        let err = ProviderError::Api {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.message(), "not found");
    }

    #[test]
    fn test_serialization_from() {
        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ProviderError::Serialization(_)));
        assert!(!err.is_remote());
    }

    #[test]
    fn test_error_to_diagnostic() {
        let err = ProviderError::Api {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.is_remote());

        let diag: Diagnostic = err.into();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.summary, "HashiCups API request failed");
        assert_eq!(
            diag.detail.as_deref(),
            Some("HashiCups API returned status 502: bad gateway")
        );

        let diag: Diagnostic = ProviderError::NotFound("42".to_string()).into();
        assert_eq!(diag.summary, "Coffee not found");

        let diag: Diagnostic =
            ProviderError::Configuration("provider has not been configured".to_string()).into();
        assert_eq!(diag.summary, "Invalid provider configuration");
        assert!(diag.detail.unwrap().contains("not been configured"));
    }
}
