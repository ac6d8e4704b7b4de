use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ClientConfig, ClientError, CreateDatabasePayload, CreateDatabaseResponse, Credentials,
    ListDatabasesResponse, PostgresFlexApi,
};

/// HTTP implementation of [`PostgresFlexApi`]
///
/// No retries and no caching: every call maps to exactly one request.
#[derive(Debug, Clone)]
pub struct HttpPostgresFlexClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpPostgresFlexClient {
    /// Build a client from a validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url()?;
        let credentials = config
            .credentials
            .clone()
            .ok_or_else(|| ClientError::Config("no credentials configured".to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v1/projects/{project_id}/instances/{instance_id}/databases[/{database_id}]`
    ///
    /// Identifiers are percent-encoded as single segments. Empty and dot
    /// segments are rejected.
    fn databases_url(
        &self,
        project_id: &str,
        instance_id: &str,
        database_id: Option<&str>,
    ) -> Result<Url, ClientError> {
        let mut params = vec![("project_id", project_id), ("instance_id", instance_id)];
        params.extend(database_id.map(|id| ("database_id", id)));
        for (name, value) in &params {
            if matches!(*value, "" | "." | "..") {
                return Err(ClientError::InvalidPathParameter {
                    name: *name,
                    value: value.to_string(),
                });
            }
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("parsing base URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ClientError::Config(format!("base URL {:?} cannot hold a path", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["v1", "projects", project_id, "instances", instance_id, "databases"]);
            if let Some(database_id) = database_id {
                segments.push(database_id);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.credentials.token())
    }

    /// Turn non-success responses into [`ClientError::Api`]
    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<unreadable body: {}>", e),
        };
        Err(ClientError::Api {
            status_code: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PostgresFlexApi for HttpPostgresFlexClient {
    async fn create_database(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &CreateDatabasePayload,
    ) -> Result<CreateDatabaseResponse, ClientError> {
        let url = self.databases_url(project_id, instance_id, None)?;
        debug!(%url, "POST create database");

        let response = self
            .authorized(self.client.post(url))
            .json(payload)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn list_databases(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<ListDatabasesResponse, ClientError> {
        let url = self.databases_url(project_id, instance_id, None)?;
        debug!(%url, "GET list databases");

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = Self::check_status(response).await?;
        Self::decode(response).await
    }

    async fn delete_database(
        &self,
        project_id: &str,
        instance_id: &str,
        database_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.databases_url(project_id, instance_id, Some(database_id))?;
        debug!(%url, "DELETE database");

        let response = self.authorized(self.client.delete(url)).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
