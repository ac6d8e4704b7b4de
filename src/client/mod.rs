//! Postgres Flex service client
//!
//! The service exposes databases as children of an instance. There is no
//! endpoint to fetch a single database; callers list all databases of an
//! instance and pick the one they need.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub mod config;
pub mod transport;

pub use config::{ClientConfig, Credentials};
pub use transport::HttpPostgresFlexClient;

/// Request body for creating a database
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CreateDatabasePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<HashMap<String, String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CreateDatabaseResponse {
    #[serde(default)]
    pub id: Option<String>,
}

/// A database as reported by the service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InstanceDatabase {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form options; `owner` is expected to hold a string
    #[serde(default)]
    pub options: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ListDatabasesResponse {
    #[serde(default)]
    pub databases: Option<Vec<InstanceDatabase>>,
}

/// Errors returned by a [`PostgresFlexApi`] implementation
#[derive(Debug)]
pub enum ClientError {
    /// The client could not be built from the given configuration
    Config(String),
    /// Request never produced an HTTP response
    Transport(reqwest::Error),
    /// The service answered with a non-success status
    Api { status_code: u16, body: String },
    /// The response body could not be decoded
    Decode(String),
    /// An identifier cannot be used as a URL path segment
    InvalidPathParameter { name: &'static str, value: String },
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status_code, .. } => Some(*status_code),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(e) => write!(f, "{}", e),
            ClientError::Transport(e) => write!(f, "{}", e),
            ClientError::Api { status_code, body } => {
                let status = StatusCode::from_u16(*status_code)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| status_code.to_string());
                write!(f, "{}, status code {}, Body: {}", status, status_code, body)
            }
            ClientError::Decode(e) => write!(f, "decoding response: {}", e),
            ClientError::InvalidPathParameter { name, value } => {
                write!(f, "invalid {} {:?}: not usable as a path segment", name, value)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

/// Operations of the Postgres Flex service used by the database resource
#[async_trait]
pub trait PostgresFlexApi: Send + Sync {
    /// Create a database in an instance
    async fn create_database(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &CreateDatabasePayload,
    ) -> Result<CreateDatabaseResponse, ClientError>;

    /// List all databases of an instance, in server order
    async fn list_databases(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<ListDatabasesResponse, ClientError>;

    /// Delete a database from an instance
    async fn delete_database(
        &self,
        project_id: &str,
        instance_id: &str,
        database_id: &str,
    ) -> Result<(), ClientError>;
}
