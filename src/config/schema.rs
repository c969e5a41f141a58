//! config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: the base URL must be http(s), the
//! timeout must be within 1..=300 seconds, and the secrets provider must be
//! one the binary knows.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::secrets::VALID_PROVIDERS;

/// Longest request timeout accepted, in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// [api]
/// base_url = "http://localhost:8000"
/// request_timeout_secs = 30
/// refresh_path = "/refresh"
///
/// [session]
/// min_password_length = 4
/// allow_memory_only = false
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api: Option<ApiConfig>,
    pub session: Option<SessionConfig>,
    pub secrets: Option<SecretsConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(api) = &self.api {
            api.validate()?;
        }
        if let Some(session) = &self.session {
            session.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        Ok(())
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Server root, e.g. `https://foodcare.example.com`
    pub base_url: Option<String>,

    /// Timeout for every request, in seconds
    pub request_timeout_secs: Option<u64>,

    /// Path of the token refresh endpoint
    pub refresh_path: Option<String>,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid api.base_url '{}': {}", base_url, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue(format!(
                    "api.base_url must be http or https, got '{}'",
                    url.scheme()
                )));
            }
        }

        if let Some(secs) = self.request_timeout_secs {
            if secs == 0 || secs > MAX_REQUEST_TIMEOUT_SECS {
                return Err(ConfigError::InvalidValue(format!(
                    "api.request_timeout_secs must be between 1 and {}, got {}",
                    MAX_REQUEST_TIMEOUT_SECS, secs
                )));
            }
        }

        if let Some(path) = &self.refresh_path {
            if !path.starts_with('/') || path.trim_matches('/').is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "api.refresh_path must be an absolute path like '/refresh', got '{}'",
                    path
                )));
            }
        }

        Ok(())
    }
}

/// Session behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Minimum password length checked before login and registration
    pub min_password_length: Option<usize>,

    /// Keep a session in memory when it cannot be saved
    pub allow_memory_only: Option<bool>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_password_length == Some(0) {
            return Err(ConfigError::InvalidValue(
                "session.min_password_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use ("file", "keychain" or "memory")
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod file_config {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            let config = FileConfig::default();
            assert!(config.api.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn parses_full_document() {
            let config: FileConfig = toml::from_str(
                r#"
                [api]
                base_url = "https://foodcare.example.com"
                request_timeout_secs = 10
                refresh_path = "/auth/refresh"

                [session]
                min_password_length = 8
                allow_memory_only = true

                [secrets]
                provider = "memory"
                "#,
            )
            .expect("parse");

            assert!(config.validate().is_ok());
            let api = config.api.expect("api");
            assert_eq!(api.request_timeout_secs, Some(10));
            assert_eq!(config.session.expect("session").min_password_length, Some(8));
        }

        #[test]
        fn roundtrip() {
            let config = FileConfig {
                api: Some(ApiConfig {
                    base_url: Some("http://localhost:8000".to_string()),
                    request_timeout_secs: Some(30),
                    refresh_path: Some("/refresh".to_string()),
                }),
                session: Some(SessionConfig {
                    min_password_length: Some(4),
                    allow_memory_only: Some(false),
                }),
                secrets: Some(SecretsConfig {
                    provider: Some("file".to_string()),
                }),
            };

            let toml = toml::to_string_pretty(&config).expect("serialize");
            let parsed: FileConfig = toml::from_str(&toml).expect("parse");
            assert_eq!(config, parsed);
        }

        #[test]
        fn reject_unknown_fields() {
            let result: Result<FileConfig, _> = toml::from_str(
                r#"
                [api]
                base_url = "http://localhost:8000"
                retries = 3
                "#,
            );
            assert!(result.is_err());
        }
    }

    mod api_config {
        use super::*;

        #[test]
        fn rejects_non_http_url() {
            let config = ApiConfig {
                base_url: Some("ftp://example.com".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_unparseable_url() {
            let config = ApiConfig {
                base_url: Some("localhost:8000 oops".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn timeout_bounds() {
            for (secs, ok) in [(0, false), (1, true), (300, true), (301, false)] {
                let config = ApiConfig {
                    request_timeout_secs: Some(secs),
                    ..Default::default()
                };
                assert_eq!(config.validate().is_ok(), ok, "timeout {}", secs);
            }
        }

        #[test]
        fn refresh_path_must_be_absolute() {
            for (path, ok) in [("/refresh", true), ("refresh", false), ("/", false)] {
                let config = ApiConfig {
                    refresh_path: Some(path.to_string()),
                    ..Default::default()
                };
                assert_eq!(config.validate().is_ok(), ok, "path {}", path);
            }
        }
    }

    mod session_config {
        use super::*;

        #[test]
        fn zero_password_length_rejected() {
            let config = SessionConfig {
                min_password_length: Some(0),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    mod secrets_config {
        use super::*;

        #[test]
        fn known_providers() {
            for provider in ["file", "keychain", "memory"] {
                let config = SecretsConfig {
                    provider: Some(provider.to_string()),
                };
                assert!(config.validate().is_ok(), "provider {}", provider);
            }
        }

        #[test]
        fn invalid_provider() {
            let config = SecretsConfig {
                provider: Some("invalid".to_string()),
            };
            assert!(config.validate().is_err());
        }
    }
}
