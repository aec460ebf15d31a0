//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::session::Accounts;

/// API versions served by the OCS endpoint.
pub const SUPPORTED_API_VERSIONS: [u8; 2] = [1, 2];

/// Connection settings for the server under test, derived from defaults,
/// configuration files, and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "OCS")]
pub struct ProvisioningConfig {
    /// OCS base URL of the local server, for example
    /// `http://localhost:8080/ocs/`.
    #[ortho_config(default = "http://localhost:8080/ocs/".to_owned())]
    pub base_url: String,
    /// OCS base URL of the federated remote server, when scenarios use one.
    pub remote_base_url: Option<String>,
    /// Version used for the `v{N}.php` endpoints that are not pinned to v2.
    #[ortho_config(default = 1)]
    pub api_version: u8,
    /// Administrator login name.
    #[ortho_config(default = "admin".to_owned())]
    pub admin_username: String,
    /// Administrator password.
    #[ortho_config(default = "admin".to_owned())]
    pub admin_password: String,
    /// Password given to users created without an explicit password.
    #[ortho_config(default = "123456".to_owned())]
    pub regular_user_password: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ProvisioningConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to the configuration file",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments, which
    /// belong to the subcommand parser.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("ocs-provision")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the password book for this configuration.
    #[must_use]
    pub fn accounts(&self) -> Accounts {
        Accounts::new(
            self.admin_username.clone(),
            self.admin_password.clone(),
            self.regular_user_password.clone(),
        )
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.base_url,
            &FieldMetadata::new("OCS base URL", "OCS_BASE_URL", "base_url"),
        )?;
        Self::require_field(
            &self.admin_username,
            &FieldMetadata::new(
                "administrator login",
                "OCS_ADMIN_USERNAME",
                "admin_username",
            ),
        )?;
        Self::require_field(
            &self.admin_password,
            &FieldMetadata::new(
                "administrator password",
                "OCS_ADMIN_PASSWORD",
                "admin_password",
            ),
        )?;
        Self::require_field(
            &self.regular_user_password,
            &FieldMetadata::new(
                "default user password",
                "OCS_REGULAR_USER_PASSWORD",
                "regular_user_password",
            ),
        )?;
        if let Some(remote) = &self.remote_base_url {
            Self::require_field(
                remote,
                &FieldMetadata::new(
                    "remote OCS base URL",
                    "OCS_REMOTE_BASE_URL",
                    "remote_base_url",
                ),
            )?;
        }
        if !SUPPORTED_API_VERSIONS.contains(&self.api_version) {
            return Err(ConfigError::Invalid(format!(
                "api_version must be 1 or 2, got {} (OCS_API_VERSION)",
                self.api_version
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unsupported value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
