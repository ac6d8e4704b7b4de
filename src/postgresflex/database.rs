//! Postgres Flex database resource
//!
//! Keeps a declarative [`Model`] in sync with a database inside a Postgres
//! Flex instance. Every attribute is immutable, so the resource only knows
//! create, read and delete; the driver replaces the resource on any change.

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, Instrument, Span};

use crate::client::{
    ClientConfig, CreateDatabasePayload, HttpPostgresFlexClient, InstanceDatabase,
    PostgresFlexApi,
};
use crate::config::ProviderData;
use crate::error::{AppError, AppResult};
use crate::logging::database_span;
use crate::resource::{
    ConfigureRequest, ConfigureResponse, CreateRequest, CreateResponse, DeleteRequest,
    DeleteResponse, ImportStateRequest, ImportStateResponse, MetadataRequest, MetadataResponse,
    ReadRequest, ReadResponse, Resource, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithValidateConfig, StateModel, UpdateRequest, UpdateResponse,
    ValidateConfigRequest, ValidateConfigResponse,
};
use crate::schema::{Attribute, PlanModifier, Schema, Validator};
use crate::utils::{join_id, split_id};

pub const TYPE_NAME_SUFFIX: &str = "_postgresflex_database";

const OWNER_OPTION: &str = "owner";

lazy_static! {
    pub static ref DATABASE_SCHEMA: Schema = Schema::new(
        "Postgres Flex database resource schema. Must have a `region` specified in the provider configuration.",
    )
    .with_attribute(
        "id",
        Attribute::computed_string(
            "Internal resource ID. It is structured as \"`project_id`,`instance_id`,`database_id`\".",
        )
        .with_plan_modifier(PlanModifier::UseStateForUnknown),
    )
    .with_attribute(
        "database_id",
        Attribute::computed_string("Database ID.")
            .with_plan_modifier(PlanModifier::UseStateForUnknown)
            .with_validator(Validator::NoSeparator),
    )
    .with_attribute(
        "instance_id",
        Attribute::required_string("ID of the Postgres Flex instance.")
            .with_plan_modifier(PlanModifier::RequiresReplace)
            .with_plan_modifier(PlanModifier::UseStateForUnknown)
            .with_validator(Validator::Uuid)
            .with_validator(Validator::NoSeparator),
    )
    .with_attribute(
        "project_id",
        Attribute::required_string("STACKIT project ID to which the instance is associated.")
            .with_plan_modifier(PlanModifier::RequiresReplace)
            .with_plan_modifier(PlanModifier::UseStateForUnknown)
            .with_validator(Validator::Uuid)
            .with_validator(Validator::NoSeparator),
    )
    .with_attribute(
        "name",
        Attribute::required_string("Database name.")
            .with_plan_modifier(PlanModifier::RequiresReplace),
    )
    .with_attribute(
        "owner",
        Attribute::required_string("Username of the database owner.")
            .with_plan_modifier(PlanModifier::RequiresReplace),
    );
}

/// Declarative record of a Postgres Flex database
///
/// `id` and `database_id` are computed: only the resource writes them.
/// The remaining fields are caller input. `None` stands for null or unknown.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Model {
    /// `project_id,instance_id,database_id`
    pub id: Option<String>,
    pub database_id: Option<String>,
    pub instance_id: Option<String>,
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub owner: Option<String>,
}

impl Model {
    /// A planned record with all caller input set and computed fields unknown
    pub fn new(
        project_id: impl Into<String>,
        instance_id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            database_id: None,
            instance_id: Some(instance_id.into()),
            project_id: Some(project_id.into()),
            name: Some(name.into()),
            owner: Some(owner.into()),
        }
    }

    pub fn project_id(&self) -> &str {
        self.project_id.as_deref().unwrap_or_default()
    }

    pub fn instance_id(&self) -> &str {
        self.instance_id.as_deref().unwrap_or_default()
    }

    pub fn database_id(&self) -> &str {
        self.database_id.as_deref().unwrap_or_default()
    }
}

impl StateModel for Model {
    fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_deref(),
            "database_id" => self.database_id.as_deref(),
            "instance_id" => self.instance_id.as_deref(),
            "project_id" => self.project_id.as_deref(),
            "name" => self.name.as_deref(),
            "owner" => self.owner.as_deref(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: String) -> AppResult<()> {
        let field = match name {
            "id" => &mut self.id,
            "database_id" => &mut self.database_id,
            "instance_id" => &mut self.instance_id,
            "project_id" => &mut self.project_id,
            "name" => &mut self.name,
            "owner" => &mut self.owner,
            _ => {
                return Err(AppError::Validation(format!(
                    "unknown attribute {:?}",
                    name
                )))
            }
        };
        *field = Some(value);
        Ok(())
    }
}

/// Copy the remote database into the record
///
/// The record's `database_id` wins over the remote id when both are set.
/// A missing `owner` option keeps the record's owner. On error the record is
/// left untouched.
pub fn map_fields(database: &InstanceDatabase, model: &mut Model) -> AppResult<()> {
    let remote_id = database
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidResponse("id not present".to_string()))?;

    let database_id = match model.database_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => remote_id.to_string(),
    };

    let owner = match database
        .options
        .as_ref()
        .and_then(|options| options.get(OWNER_OPTION))
    {
        Some(Value::String(owner)) => Some(owner.clone()),
        Some(_) => return Err(AppError::TypeMismatch("owner is not a string".to_string())),
        None => model.owner.clone(),
    };

    model.id = Some(join_id(&[
        model.project_id(),
        model.instance_id(),
        &database_id,
    ]));
    model.database_id = Some(database_id);
    model.name = database.name.clone();
    model.owner = owner;

    Ok(())
}

/// Build the create request from the record
pub fn to_create_payload(model: &Model) -> CreateDatabasePayload {
    CreateDatabasePayload {
        name: model.name.clone(),
        options: Some(HashMap::from([(
            OWNER_OPTION.to_string(),
            model.owner.clone().unwrap_or_default(),
        )])),
    }
}

/// Find a database by listing all databases of the instance
///
/// The service has no endpoint for a single database. The list is scanned in
/// server order and the first database with a matching id wins. A missing
/// instance (404) or a missing database both yield [`AppError::NotFound`].
pub async fn get_database(
    client: &dyn PostgresFlexApi,
    project_id: &str,
    instance_id: &str,
    database_id: &str,
) -> AppResult<InstanceDatabase> {
    let resp = client
        .list_databases(project_id, instance_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound(format!("instance not found: {}", e))
            } else {
                AppError::RemoteCall(e)
            }
        })?;

    let databases = resp
        .databases
        .ok_or_else(|| AppError::InvalidResponse("response is nil".to_string()))?;

    databases
        .into_iter()
        .find(|database| database.id.as_deref() == Some(database_id))
        .ok_or_else(|| AppError::NotFound("database not found".to_string()))
}

/// The database resource
///
/// Holds nothing but the API client, which is set at most once by
/// [`ResourceWithConfigure::configure`].
#[derive(Default)]
pub struct DatabaseResource {
    client: OnceLock<Arc<dyn PostgresFlexApi>>,
}

impl DatabaseResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource that is already configured with `client`
    pub fn with_client(client: Arc<dyn PostgresFlexApi>) -> Self {
        let resource = Self::new();
        let _ = resource.client.set(client);
        resource
    }

    pub fn is_configured(&self) -> bool {
        self.client.get().is_some()
    }

    /// Build the HTTP client, preferring a custom endpoint over the region
    pub fn build_client(provider_data: &ProviderData) -> AppResult<HttpPostgresFlexClient> {
        let config = ClientConfig::new().with_custom_auth(provider_data.credentials.clone());
        let config = match provider_data.custom_endpoint() {
            Some(endpoint) => config.with_endpoint(endpoint),
            None => config.with_region(&provider_data.region),
        };
        HttpPostgresFlexClient::new(&config).map_err(|e| AppError::Configuration(e.to_string()))
    }

    fn client(&self) -> AppResult<&dyn PostgresFlexApi> {
        self.client.get().map(|client| client.as_ref()).ok_or_else(|| {
            AppError::Configuration(
                "Postgres Flex API client is not configured, the provider must be configured first"
                    .to_string(),
            )
        })
    }

    async fn create_database(&self, mut model: Model, resp: &mut CreateResponse<Model>) {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                resp.diagnostics
                    .log_and_add_error("Error creating database", &e.to_string());
                return;
            }
        };
        let project_id = model.project_id().to_string();
        let instance_id = model.instance_id().to_string();

        let payload = to_create_payload(&model);
        let created = match client
            .create_database(&project_id, &instance_id, &payload)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                resp.diagnostics
                    .log_and_add_error("Error creating database", &format!("Calling API: {}", e));
                return;
            }
        };
        let database_id = match created.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let e = AppError::PartialFailure(
                    "API didn't return database Id. A database might have been created"
                        .to_string(),
                );
                resp.diagnostics
                    .log_and_add_error("Error creating database", &e.to_string());
                return;
            }
        };
        Span::current().record("database_id", database_id.as_str());

        // The create response is not the full object
        let database = match get_database(client, &project_id, &instance_id, &database_id).await {
            Ok(database) => database,
            Err(e) => {
                resp.diagnostics.log_and_add_error(
                    "Error creating database",
                    &format!("Getting database details after creation: {}", e),
                );
                return;
            }
        };

        if let Err(e) = map_fields(&database, &mut model) {
            resp.diagnostics.log_and_add_error(
                "Error creating database",
                &format!("Processing API payload: {}", e),
            );
            return;
        }

        resp.state.set(model);
        info!("Postgres Flex database created");
    }

    async fn read_database(&self, mut model: Model, resp: &mut ReadResponse<Model>) {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                resp.diagnostics
                    .log_and_add_error("Error reading database", &e.to_string());
                return;
            }
        };

        let database = match get_database(
            client,
            model.project_id(),
            model.instance_id(),
            model.database_id(),
        )
        .await
        {
            Ok(database) => database,
            Err(e) if e.is_not_found() => {
                info!(reason = %e, "Postgres Flex database not found, removing from state");
                resp.state.remove_resource();
                return;
            }
            Err(e) => {
                resp.diagnostics
                    .log_and_add_error("Error reading database", &format!("Calling API: {}", e));
                return;
            }
        };

        if let Err(e) = map_fields(&database, &mut model) {
            resp.diagnostics.log_and_add_error(
                "Error reading database",
                &format!("Processing API payload: {}", e),
            );
            return;
        }

        resp.state.set(model);
        info!("Postgres Flex database read");
    }

    async fn delete_database(&self, model: Model, resp: &mut DeleteResponse<Model>) {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                resp.diagnostics
                    .log_and_add_error("Error deleting database", &e.to_string());
                return;
            }
        };

        if let Err(e) = client
            .delete_database(model.project_id(), model.instance_id(), model.database_id())
            .await
        {
            resp.diagnostics
                .log_and_add_error("Error deleting database", &format!("Calling API: {}", e));
            return;
        }

        resp.state.remove_resource();
        info!("Postgres Flex database deleted");
    }
}

#[async_trait]
impl Resource for DatabaseResource {
    type Model = Model;

    fn metadata(&self, req: &MetadataRequest, resp: &mut MetadataResponse) {
        resp.type_name = format!("{}{}", req.provider_type_name, TYPE_NAME_SUFFIX);
    }

    fn schema(&self) -> Schema {
        DATABASE_SCHEMA.clone()
    }

    async fn create(&self, req: CreateRequest<Model>, resp: &mut CreateResponse<Model>) {
        let span = database_span("create", req.plan.project_id(), req.plan.instance_id());
        self.create_database(req.plan, resp).instrument(span).await
    }

    async fn read(&self, req: ReadRequest<Model>, resp: &mut ReadResponse<Model>) {
        let span = database_span("read", req.state.project_id(), req.state.instance_id());
        span.record("database_id", req.state.database_id());
        self.read_database(req.state, resp).instrument(span).await
    }

    async fn update(&self, _req: UpdateRequest<Model>, resp: &mut UpdateResponse<Model>) {
        // Every attribute requires replacement, the driver never plans an update
        resp.diagnostics
            .log_and_add_error("Error updating database", "Database can't be updated");
    }

    async fn delete(&self, req: DeleteRequest<Model>, resp: &mut DeleteResponse<Model>) {
        let span = database_span("delete", req.state.project_id(), req.state.instance_id());
        span.record("database_id", req.state.database_id());
        self.delete_database(req.state, resp).instrument(span).await
    }
}

impl ResourceWithConfigure for DatabaseResource {
    fn configure(&self, req: ConfigureRequest, resp: &mut ConfigureResponse) {
        // The driver calls configure before provider data exists
        let Some(provider_data) = req.provider_data else {
            return;
        };

        let Some(provider_data) = provider_data.downcast_ref::<ProviderData>() else {
            resp.diagnostics.log_and_add_error(
                "Error configuring API client",
                "Expected configure type ProviderData, got a different provider data type",
            );
            return;
        };

        if self.is_configured() {
            debug!("Postgres Flex database client already configured");
            return;
        }

        match Self::build_client(provider_data) {
            Ok(client) => {
                let _ = self.client.set(Arc::new(client));
                info!("Postgres Flex database client configured");
            }
            Err(e) => resp.diagnostics.log_and_add_error(
                "Error configuring API client",
                &format!(
                    "Configuring client: {}. This is an error related to the provider configuration, not to the resource configuration",
                    e
                ),
            ),
        }
    }
}

impl ResourceWithValidateConfig for DatabaseResource {
    fn validate_config(&self, req: &ValidateConfigRequest<Model>, resp: &mut ValidateConfigResponse) {
        let diags = DATABASE_SCHEMA.validate(|name| req.config.attribute(name));
        resp.diagnostics.append(diags);
    }
}

#[async_trait]
impl ResourceWithImportState for DatabaseResource {
    /// Expects `project_id,instance_id,database_id`
    async fn import_state(&self, req: ImportStateRequest, resp: &mut ImportStateResponse<Model>) {
        let Some([project_id, instance_id, database_id]) = split_id::<3>(&req.id) else {
            let e = AppError::Validation(format!(
                "Expected import identifier with format [project_id],[instance_id],[database_id], got {:?}",
                req.id
            ));
            resp.diagnostics
                .log_and_add_error("Error importing database", &e.to_string());
            return;
        };

        for (name, value) in [
            ("project_id", project_id),
            ("instance_id", instance_id),
            ("database_id", database_id),
        ] {
            if let Err(e) = resp.state.set_attribute(name, value) {
                resp.diagnostics
                    .log_and_add_error("Error importing database", &e.to_string());
            }
        }

        resp.diagnostics.log_and_add_warning(
            "Postgresflex database imported with empty password",
            "The database password is not imported as it is only available upon creation of a new database. The password field will be empty.",
        );
        info!("Postgres Flex database state imported");
    }
}
