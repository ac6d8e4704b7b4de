use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::time::Duration;

use super::ClientError;

lazy_static! {
    static ref REGION_PATTERN: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

/// Base URL template for the region-based construction path
const REGIONAL_ENDPOINT_TEMPLATE: &str = "https://postgres-flex-service.api.{region}.stackit.cloud";

/// Authentication material attached to every request
#[derive(Clone, PartialEq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }
}

// Keep tokens out of debug output and logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("token", &"***").finish()
    }
}

/// Configuration for building a Postgres Flex client
///
/// A client talks either to a custom endpoint or to the regional service
/// endpoint. Exactly one of the two must be set.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub credentials: Option<Credentials>,

    /// Full base URL, e.g. "https://postgres-flex.example.test"
    pub endpoint: Option<String>,

    /// Region name used to derive the service URL, e.g. "eu01"
    pub region: Option<String>,

    /// Request timeout, transport default when unset
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach credentials sent as a bearer token
    pub fn with_custom_auth(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use a custom endpoint instead of the regional one
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClientError> {
        match &self.credentials {
            Some(credentials) if !credentials.is_empty() => {}
            _ => {
                return Err(ClientError::Config(
                    "no credentials configured, a service account token is required".to_string(),
                ))
            }
        }

        match (&self.endpoint, &self.region) {
            (Some(_), Some(_)) => Err(ClientError::Config(
                "endpoint and region are mutually exclusive".to_string(),
            )),
            (None, None) => Err(ClientError::Config(
                "either an endpoint or a region must be configured".to_string(),
            )),
            (Some(endpoint), None) => {
                let parsed = url::Url::parse(endpoint).map_err(|e| {
                    ClientError::Config(format!("invalid endpoint {:?}: {}", endpoint, e))
                })?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(ClientError::Config(format!(
                        "invalid endpoint {:?}: scheme must be http or https",
                        endpoint
                    )));
                }
                Ok(())
            }
            (None, Some(region)) => {
                if !REGION_PATTERN.is_match(region) {
                    return Err(ClientError::Config(format!("invalid region {:?}", region)));
                }
                Ok(())
            }
        }
    }

    /// Resolve the base URL requests are sent to
    pub fn base_url(&self) -> Result<String, ClientError> {
        self.validate()?;
        match (&self.endpoint, &self.region) {
            (Some(endpoint), _) => Ok(endpoint.trim_end_matches('/').to_string()),
            (None, Some(region)) => Ok(REGIONAL_ENDPOINT_TEMPLATE.replace("{region}", region)),
            (None, None) => Err(ClientError::Config(
                "either an endpoint or a region must be configured".to_string(),
            )),
        }
    }
}
