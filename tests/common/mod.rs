#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{delete, get},
    Json, Router,
};
use postgresflex_provider::client::{
    ClientError, CreateDatabasePayload, CreateDatabaseResponse, InstanceDatabase,
    ListDatabasesResponse, PostgresFlexApi,
};
use postgresflex_provider::DatabaseModel;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const PROJECT_ID: &str = "cae27bba-c43d-498a-861e-d11d241c4ff8";
pub const INSTANCE_ID: &str = "7a0c3d1e-5f4b-4e8a-9c2d-1b3e5f7a9c0d";
pub const TOKEN: &str = "test-token";

/// A planned record for a new database
pub fn planned_model(name: &str, owner: &str) -> DatabaseModel {
    DatabaseModel::new(PROJECT_ID, INSTANCE_ID, name, owner)
}

pub fn database(id: &str, name: &str, owner: Value) -> InstanceDatabase {
    InstanceDatabase {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        options: Some(HashMap::from([("owner".to_string(), owner)])),
    }
}

/// How the mock answers create calls
#[derive(Debug, Clone)]
pub enum CreateBehavior {
    /// Store the database and return a generated id
    Store,
    /// Return this response without storing anything
    Respond(CreateDatabaseResponse),
    /// Fail with this status code
    Fail(u16),
}

/// In-memory stand-in for the Postgres Flex service
pub struct MockPostgresFlexApi {
    databases: Mutex<Vec<InstanceDatabase>>,
    next_id: AtomicU64,
    create_behavior: Mutex<CreateBehavior>,
    list_error: Mutex<Option<u16>>,
    null_list: Mutex<bool>,
    delete_error: Mutex<Option<u16>>,
    calls: Mutex<Vec<String>>,
    payloads: Mutex<Vec<CreateDatabasePayload>>,
}

impl MockPostgresFlexApi {
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            create_behavior: Mutex::new(CreateBehavior::Store),
            list_error: Mutex::new(None),
            null_list: Mutex::new(false),
            delete_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_databases(databases: Vec<InstanceDatabase>) -> Self {
        let mock = Self::new();
        *mock.databases.lock().unwrap() = databases;
        mock
    }

    pub fn set_create_behavior(&self, behavior: CreateBehavior) {
        *self.create_behavior.lock().unwrap() = behavior;
    }

    pub fn fail_list(&self, status_code: u16) {
        *self.list_error.lock().unwrap() = Some(status_code);
    }

    pub fn return_null_list(&self) {
        *self.null_list.lock().unwrap() = true;
    }

    pub fn fail_delete(&self, status_code: u16) {
        *self.delete_error.lock().unwrap() = Some(status_code);
    }

    /// Simulate an out-of-band removal
    pub fn remove_database(&self, id: &str) {
        self.databases
            .lock()
            .unwrap()
            .retain(|db| db.id.as_deref() != Some(id));
    }

    pub fn databases(&self) -> Vec<InstanceDatabase> {
        self.databases.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<CreateDatabasePayload> {
        self.payloads.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn api_error(status_code: u16) -> ClientError {
    ClientError::Api {
        status_code,
        body: format!("{{\"message\":\"mock error {}\"}}", status_code),
    }
}

#[async_trait]
impl PostgresFlexApi for MockPostgresFlexApi {
    async fn create_database(
        &self,
        project_id: &str,
        instance_id: &str,
        payload: &CreateDatabasePayload,
    ) -> Result<CreateDatabaseResponse, ClientError> {
        self.record(format!("create {} {}", project_id, instance_id));
        self.payloads.lock().unwrap().push(payload.clone());

        let behavior = self.create_behavior.lock().unwrap().clone();
        match behavior {
            CreateBehavior::Store => {
                let id = format!("db-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
                let options = payload.options.as_ref().map(|options| {
                    options
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect()
                });
                self.databases.lock().unwrap().push(InstanceDatabase {
                    id: Some(id.clone()),
                    name: payload.name.clone(),
                    options,
                });
                Ok(CreateDatabaseResponse { id: Some(id) })
            }
            CreateBehavior::Respond(resp) => Ok(resp),
            CreateBehavior::Fail(status_code) => Err(api_error(status_code)),
        }
    }

    async fn list_databases(
        &self,
        project_id: &str,
        instance_id: &str,
    ) -> Result<ListDatabasesResponse, ClientError> {
        self.record(format!("list {} {}", project_id, instance_id));

        if let Some(status_code) = *self.list_error.lock().unwrap() {
            return Err(api_error(status_code));
        }
        if *self.null_list.lock().unwrap() {
            return Ok(ListDatabasesResponse { databases: None });
        }
        Ok(ListDatabasesResponse {
            databases: Some(self.databases()),
        })
    }

    async fn delete_database(
        &self,
        project_id: &str,
        instance_id: &str,
        database_id: &str,
    ) -> Result<(), ClientError> {
        self.record(format!("delete {} {} {}", project_id, instance_id, database_id));

        if let Some(status_code) = *self.delete_error.lock().unwrap() {
            return Err(api_error(status_code));
        }
        self.remove_database(database_id);
        Ok(())
    }
}

/// Backing store of the mock HTTP service
#[derive(Default)]
pub struct ServiceState {
    pub instances: Mutex<HashSet<(String, String)>>,
    pub databases: Mutex<HashMap<(String, String), Vec<InstanceDatabase>>>,
    pub next_id: AtomicU64,
    /// (project, instance, database) of every delete that reached the route, decoded
    pub delete_requests: Mutex<Vec<(String, String, String)>>,
    /// Requests that matched no route, as "METHOD path"
    pub unmatched: Mutex<Vec<String>>,
}

impl ServiceState {
    pub fn with_instance(project_id: &str, instance_id: &str) -> Arc<Self> {
        let state = Self::default();
        state
            .instances
            .lock()
            .unwrap()
            .insert((project_id.to_string(), instance_id.to_string()));
        Arc::new(state)
    }
}

type ApiResult = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "code": status.as_u16(), "message": message })))
}

fn authorize(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|h| h.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized")),
    }
}

fn check_instance(
    state: &ServiceState,
    key: &(String, String),
) -> Result<(), (StatusCode, Json<Value>)> {
    if state.instances.lock().unwrap().contains(key) {
        Ok(())
    } else {
        Err(error_response(StatusCode::NOT_FOUND, "instance not found"))
    }
}

async fn create_database(
    State(state): State<Arc<ServiceState>>,
    Path((project_id, instance_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<CreateDatabasePayload>,
) -> ApiResult {
    authorize(&headers)?;
    let key = (project_id, instance_id);
    check_instance(&state, &key)?;

    let id = format!("db-{}", state.next_id.fetch_add(1, Ordering::Relaxed) + 1);
    let options = payload.options.map(|options| {
        options
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    });
    state
        .databases
        .lock()
        .unwrap()
        .entry(key)
        .or_default()
        .push(InstanceDatabase {
            id: Some(id.clone()),
            name: payload.name,
            options,
        });

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_databases(
    State(state): State<Arc<ServiceState>>,
    Path((project_id, instance_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult {
    authorize(&headers)?;
    let key = (project_id, instance_id);
    check_instance(&state, &key)?;

    let databases = state
        .databases
        .lock()
        .unwrap()
        .get(&key)
        .cloned()
        .unwrap_or_default();
    Ok((StatusCode::OK, Json(json!({ "databases": databases }))))
}

async fn delete_database(
    State(state): State<Arc<ServiceState>>,
    Path((project_id, instance_id, database_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult {
    state.delete_requests.lock().unwrap().push((
        project_id.clone(),
        instance_id.clone(),
        database_id.clone(),
    ));
    authorize(&headers)?;
    let key = (project_id, instance_id);
    check_instance(&state, &key)?;

    let mut databases = state.databases.lock().unwrap();
    let list = databases.entry(key).or_default();
    let before = list.len();
    list.retain(|db| db.id.as_deref() != Some(database_id.as_str()));
    if list.len() == before {
        return Err(error_response(StatusCode::NOT_FOUND, "database not found"));
    }

    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

async fn unmatched(State(state): State<Arc<ServiceState>>, method: Method, uri: Uri) -> ApiResult {
    state
        .unmatched
        .lock()
        .unwrap()
        .push(format!("{} {}", method, uri.path()));
    Err(error_response(StatusCode::NOT_FOUND, "no such route"))
}

pub fn service_router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route(
            "/v1/projects/{project_id}/instances/{instance_id}/databases",
            get(list_databases).post(create_database),
        )
        .route(
            "/v1/projects/{project_id}/instances/{instance_id}/databases/{database_id}",
            delete(delete_database),
        )
        .fallback(unmatched)
        .with_state(state)
}

/// Serve the mock service on a loopback port and return its base URL
pub async fn spawn_service(state: Arc<ServiceState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = service_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
