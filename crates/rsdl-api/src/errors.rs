//! Error classification and HTTP error responses.
//!
//! Load and registry errors are first classified into a protocol-agnostic
//! [`LoaderErrorKind`], then rendered as an [`ApiError`] JSON body.
//!
//! # Error Detail Configuration
//!
//! [`ErrorConfig`] controls whether loader names and key values reach the
//! client. Production mode replaces them with generic messages.
//!
//! ```rust
//! use rsdl_api::errors::{classify_load_error_with_config, ErrorConfig, LoaderErrorKind};
//! use rsdl_domain::LoadError;
//!
//! let err = LoadError::MissingKeys {
//!     loader: "AccountLoader".to_string(),
//!     keys: vec!["acct-7".to_string()],
//! };
//!
//! match classify_load_error_with_config(&err, &ErrorConfig::production()) {
//!     LoaderErrorKind::NotFound(msg) => assert!(!msg.contains("acct-7")),
//!     _ => panic!("Expected NotFound"),
//! }
//!
//! match classify_load_error_with_config(&err, &ErrorConfig::development()) {
//!     LoaderErrorKind::NotFound(msg) => assert!(msg.contains("acct-7")),
//!     _ => panic!("Expected NotFound"),
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rsdl_domain::LoadError;
use rsdl_server::config::ErrorSettings;
use rsdl_server::registry::RegistryError;
use serde::Serialize;

/// Configuration for error message detail level.
#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    /// Whether to include loader names, key values and upstream messages.
    pub detailed_errors: bool,
}

impl ErrorConfig {
    /// Hides loader names and key values.
    pub fn production() -> Self {
        Self {
            detailed_errors: false,
        }
    }

    /// Shows full error details.
    pub fn development() -> Self {
        Self {
            detailed_errors: true,
        }
    }
}

impl From<&ErrorSettings> for ErrorConfig {
    fn from(settings: &ErrorSettings) -> Self {
        Self {
            detailed_errors: settings.detailed,
        }
    }
}

/// Protocol-agnostic classification of a loader failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderErrorKind {
    /// Requested entities do not exist (404)
    NotFound(String),
    /// The backing store failed (502)
    Upstream(String),
    /// Wiring or contract failure inside the server (500)
    Internal(String),
}

impl LoaderErrorKind {
    pub fn into_message(self) -> String {
        match self {
            LoaderErrorKind::NotFound(msg)
            | LoaderErrorKind::Upstream(msg)
            | LoaderErrorKind::Internal(msg) => msg,
        }
    }
}

/// Classifies a load error using production mode.
pub fn classify_load_error(err: &LoadError) -> LoaderErrorKind {
    classify_load_error_with_config(err, &ErrorConfig::production())
}

/// Classifies a load error with configurable detail level.
pub fn classify_load_error_with_config(err: &LoadError, config: &ErrorConfig) -> LoaderErrorKind {
    match err {
        LoadError::MissingKeys { .. } if config.detailed_errors => {
            LoaderErrorKind::NotFound(err.to_string())
        }
        LoadError::MissingKeys { .. } => LoaderErrorKind::NotFound("resource not found".to_string()),
        LoadError::Fetch { .. } if config.detailed_errors => {
            LoaderErrorKind::Upstream(err.to_string())
        }
        LoadError::Fetch { .. } => LoaderErrorKind::Upstream("upstream fetch failed".to_string()),
        LoadError::LengthMismatch { .. } | LoadError::Panicked { .. } | LoadError::NoValue
            if config.detailed_errors =>
        {
            LoaderErrorKind::Internal(err.to_string())
        }
        LoadError::LengthMismatch { .. } | LoadError::Panicked { .. } | LoadError::NoValue => {
            LoaderErrorKind::Internal("internal error".to_string())
        }
    }
}

/// Classifies a registry error using production mode.
///
/// Registry errors are always deployment problems, so they are all internal.
pub fn classify_registry_error(err: &RegistryError) -> LoaderErrorKind {
    classify_registry_error_with_config(err, &ErrorConfig::production())
}

/// Classifies a registry error with configurable detail level.
pub fn classify_registry_error_with_config(
    err: &RegistryError,
    config: &ErrorConfig,
) -> LoaderErrorKind {
    // The install-hook message is operator guidance, never sensitive.
    if config.detailed_errors || matches!(err, RegistryError::NotInstalled) {
        LoaderErrorKind::Internal(err.to_string())
    } else {
        LoaderErrorKind::Internal("loader unavailable".to_string())
    }
}

/// API error codes.
pub mod error_codes {
    /// The install hook was not applied to the router.
    pub const LOADER_NOT_INSTALLED: &str = "loader_not_installed";
    /// No provider is registered, or its factory failed.
    pub const LOADER_NOT_PROVIDED: &str = "loader_not_provided";
    /// Requested entities were not found by the batch function.
    pub const NOT_FOUND: &str = "not_found";
    /// The backing store failed.
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    /// Unexpected internal error.
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }

    /// Builds the response body for a load error.
    pub fn from_load_error(err: &LoadError, config: &ErrorConfig) -> Self {
        match classify_load_error_with_config(err, config) {
            LoaderErrorKind::NotFound(msg) => Self::new(error_codes::NOT_FOUND, msg),
            LoaderErrorKind::Upstream(msg) => Self::new(error_codes::UPSTREAM_ERROR, msg),
            LoaderErrorKind::Internal(msg) => Self::internal_error(msg),
        }
    }

    /// Builds the response body for a registry error.
    pub fn from_registry_error(err: &RegistryError, config: &ErrorConfig) -> Self {
        let msg = classify_registry_error_with_config(err, config).into_message();
        let code = match err {
            RegistryError::NotInstalled => error_codes::LOADER_NOT_INSTALLED,
            RegistryError::ProviderNotFound { .. } | RegistryError::ResolutionFailed { .. } => {
                error_codes::LOADER_NOT_PROVIDED
            }
            RegistryError::TypeMismatch { .. } => error_codes::INTERNAL_ERROR,
        };
        Self::new(code, msg)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            error_codes::NOT_FOUND => StatusCode::NOT_FOUND,
            error_codes::UPSTREAM_ERROR => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        Self::from_load_error(&err, &ErrorConfig::production())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::from_registry_error(&err, &ErrorConfig::production())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> LoadError {
        LoadError::MissingKeys {
            loader: "AccountLoader".to_string(),
            keys: vec!["acct-7".to_string()],
        }
    }

    // ================================================================
    // Load error classification
    // ================================================================

    #[test]
    fn test_missing_keys_hides_keys_in_production() {
        match classify_load_error(&missing()) {
            LoaderErrorKind::NotFound(msg) => {
                assert!(!msg.contains("acct-7"), "Production mode should hide keys: {msg}");
                assert!(!msg.contains("AccountLoader"));
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_keys_shows_keys_in_development() {
        match classify_load_error_with_config(&missing(), &ErrorConfig::development()) {
            LoaderErrorKind::NotFound(msg) => {
                assert_eq!(msg, "could not find acct-7 for AccountLoader");
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_failure_is_upstream() {
        let err = LoadError::fetch("connection refused");
        match classify_load_error(&err) {
            LoaderErrorKind::Upstream(msg) => assert!(!msg.contains("connection refused")),
            other => panic!("Expected Upstream, got {other:?}"),
        }
        assert_eq!(ApiError::from(err).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_contract_violations_are_internal() {
        let err = LoadError::LengthMismatch {
            expected: 2,
            actual: 1,
        };
        assert!(matches!(classify_load_error(&err), LoaderErrorKind::Internal(_)));
        assert!(matches!(
            classify_load_error(&LoadError::NoValue),
            LoaderErrorKind::Internal(_)
        ));

        let panicked = LoadError::Panicked {
            message: "slice index out of range".to_string(),
        };
        match classify_load_error(&panicked) {
            LoaderErrorKind::Internal(msg) => assert!(!msg.contains("slice index")),
            other => panic!("Expected Internal, got {other:?}"),
        }
    }

    // ================================================================
    // Registry error classification
    // ================================================================

    #[test]
    fn test_not_installed_keeps_operator_guidance() {
        let api = ApiError::from(RegistryError::NotInstalled);

        assert_eq!(api.code, error_codes::LOADER_NOT_INSTALLED);
        assert!(api.message.contains("LoaderLayer"));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_not_found_hides_name_in_production() {
        let err = RegistryError::ProviderNotFound {
            type_id: "SecretLoader".to_string(),
        };

        let production = ApiError::from(err.clone());
        assert_eq!(production.code, error_codes::LOADER_NOT_PROVIDED);
        assert!(!production.message.contains("SecretLoader"));

        let development = ApiError::from_registry_error(&err, &ErrorConfig::development());
        assert!(development.message.contains("SecretLoader"));
    }

    #[test]
    fn test_error_config_from_settings() {
        let config = ErrorConfig::from(&ErrorSettings { detailed: true });
        assert!(config.detailed_errors);
        assert!(!ErrorConfig::default().detailed_errors);
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::from(missing()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::internal_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
