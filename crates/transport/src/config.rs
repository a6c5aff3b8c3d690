//! Client-wide transport configuration.
//!
//! Loaded once at startup (usually from a JSON file passed to the CLI) and used
//! to construct a single [`crate::ReqwestTransport`]. Per-request settings
//! always win over these.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use soap::HttpError;

/// Settings applied to every request sent through one transport.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Headers sent when the request does not carry one of the same name.
    ///
    /// The request builder always sets `User-Agent`, `Accept`,
    /// `Accept-Encoding`, `Accept-Charset`, `Connection`, and `Host`, so
    /// defaults for those names never apply.
    pub default_headers: BTreeMap<String, String>,

    /// Total request timeout in milliseconds, unless the request sets its own.
    pub timeout_ms: Option<u64>,

    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,

    /// Skip TLS certificate verification. Test environments only.
    pub accept_invalid_certs: bool,

    /// Report non-2xx responses as [`HttpError::Status`] instead of returning
    /// them.
    pub reject_error_status: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_headers: BTreeMap::new(),
            timeout_ms: None,
            connect_timeout_ms: None,
            accept_invalid_certs: false,
            reject_error_status: true,
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, HttpError> {
        serde_json::from_str(json).map_err(|e| HttpError::Configuration {
            message: format!("invalid client configuration: {e}"),
        })
    }

    /// Reads and parses a JSON configuration file.
    pub async fn load(path: &Path) -> Result<Self, HttpError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HttpError::Configuration {
                message: format!("cannot read {}: {e}", path.display()),
            })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(config.reject_error_status);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn parses_all_fields() {
        let config = ClientConfig::from_json_str(
            r#"{
                "default_headers": { "X-Client": "regon" },
                "timeout_ms": 30000,
                "connect_timeout_ms": 5000,
                "accept_invalid_certs": true,
                "reject_error_status": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_headers.get("X-Client").map(String::as_str), Some("regon"));
        assert_eq!(config.timeout_ms, Some(30_000));
        assert_eq!(config.connect_timeout_ms, Some(5_000));
        assert!(config.accept_invalid_certs);
        assert!(!config.reject_error_status);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ClientConfig::from_json_str(r#"{ "retries": 3 }"#).unwrap_err();
        assert!(matches!(err, HttpError::Configuration { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_configuration_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/regon/client.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
