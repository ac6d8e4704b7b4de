use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::client::Credentials;
use crate::error::{AppError, AppResult};

pub const DEFAULT_REGION: &str = "eu01";

pub const ENV_SERVICE_ACCOUNT_TOKEN: &str = "STACKIT_SERVICE_ACCOUNT_TOKEN";
pub const ENV_REGION: &str = "STACKIT_REGION";
pub const ENV_POSTGRESFLEX_CUSTOM_ENDPOINT: &str = "STACKIT_POSTGRESFLEX_CUSTOM_ENDPOINT";

/// Provider-level configuration, as written by the operator
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub postgresflex_custom_endpoint: Option<String>,
    #[serde(default)]
    pub service_account_token: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Configuration handed to resources by the driver during configure
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderData {
    pub credentials: Credentials,
    pub region: String,
    pub postgresflex_custom_endpoint: Option<String>,
}

impl ProviderData {
    /// The custom endpoint, if one is set and non-empty
    pub fn custom_endpoint(&self) -> Option<&str> {
        self.postgresflex_custom_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
    }
}

impl ProviderConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: ProviderConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Region default, no endpoint override, no credentials
    pub fn default_config() -> Self {
        Self {
            region: default_region(),
            postgresflex_custom_endpoint: None,
            service_account_token: None,
        }
    }

    /// Override values from the environment
    ///
    /// `lookup` resolves a variable name, normally `|k| std::env::var(k).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_SERVICE_ACCOUNT_TOKEN) {
            self.service_account_token = Some(token);
        }
        if let Some(region) = lookup(ENV_REGION) {
            self.region = region;
        }
        if let Some(endpoint) = lookup(ENV_POSTGRESFLEX_CUSTOM_ENDPOINT) {
            self.postgresflex_custom_endpoint = Some(endpoint);
        }
    }

    pub fn into_provider_data(self) -> AppResult<ProviderData> {
        let token = self
            .service_account_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "no service account token configured, set service_account_token or {}",
                    ENV_SERVICE_ACCOUNT_TOKEN
                ))
            })?;

        Ok(ProviderData {
            credentials: Credentials::bearer(token),
            region: self.region,
            postgresflex_custom_endpoint: self.postgresflex_custom_endpoint,
        })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
