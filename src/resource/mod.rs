//! Driver protocol for managed resources
//!
//! The orchestration engine (the driver) owns planning, persistence and
//! retries. It calls a resource through the traits below, one lifecycle call
//! at a time, passing a typed request and reading back a typed response that
//! carries the new state and any diagnostics.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;

pub mod state;

pub use state::{State, StateModel};

#[derive(Debug, Clone, Default)]
pub struct MetadataRequest {
    pub provider_type_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataResponse {
    pub type_name: String,
}

/// Provider data is opaque to the driver; resources downcast it
#[derive(Clone, Default)]
pub struct ConfigureRequest {
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for ConfigureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigureRequest")
            .field("provider_data", &self.provider_data.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigureResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct ValidateConfigRequest<M> {
    pub config: M,
}

#[derive(Debug, Clone, Default)]
pub struct ValidateConfigResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct CreateRequest<M> {
    pub plan: M,
}

#[derive(Debug, Clone)]
pub struct CreateResponse<M> {
    pub state: State<M>,
    pub diagnostics: Diagnostics,
}

impl<M: StateModel> Default for CreateResponse<M> {
    fn default() -> Self {
        Self {
            state: State::null(),
            diagnostics: Diagnostics::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadRequest<M> {
    pub state: M,
}

/// Starts out holding the prior state
#[derive(Debug, Clone)]
pub struct ReadResponse<M> {
    pub state: State<M>,
    pub diagnostics: Diagnostics,
}

impl<M: StateModel> ReadResponse<M> {
    pub fn new(prior: M) -> Self {
        Self {
            state: State::from_model(prior),
            diagnostics: Diagnostics::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRequest<M> {
    pub state: M,
    pub plan: M,
}

/// Starts out holding the prior state
#[derive(Debug, Clone)]
pub struct UpdateResponse<M> {
    pub state: State<M>,
    pub diagnostics: Diagnostics,
}

impl<M: StateModel> UpdateResponse<M> {
    pub fn new(prior: M) -> Self {
        Self {
            state: State::from_model(prior),
            diagnostics: Diagnostics::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteRequest<M> {
    pub state: M,
}

/// Starts out holding the prior state; a successful delete nulls it
#[derive(Debug, Clone)]
pub struct DeleteResponse<M> {
    pub state: State<M>,
    pub diagnostics: Diagnostics,
}

impl<M: StateModel> DeleteResponse<M> {
    pub fn new(prior: M) -> Self {
        Self {
            state: State::from_model(prior),
            diagnostics: Diagnostics::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportStateRequest {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct ImportStateResponse<M> {
    pub state: State<M>,
    pub diagnostics: Diagnostics,
}

impl<M: StateModel> Default for ImportStateResponse<M> {
    fn default() -> Self {
        Self {
            state: State::null(),
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Core lifecycle of a managed resource
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: StateModel;

    /// Resource type name, derived from the provider type name
    fn metadata(&self, req: &MetadataRequest, resp: &mut MetadataResponse);

    fn schema(&self) -> Schema;

    /// Create the remote object and set the initial state
    async fn create(&self, req: CreateRequest<Self::Model>, resp: &mut CreateResponse<Self::Model>);

    /// Refresh state from the remote object; a null state drops the resource
    async fn read(&self, req: ReadRequest<Self::Model>, resp: &mut ReadResponse<Self::Model>);

    async fn update(&self, req: UpdateRequest<Self::Model>, resp: &mut UpdateResponse<Self::Model>);

    async fn delete(&self, req: DeleteRequest<Self::Model>, resp: &mut DeleteResponse<Self::Model>);
}

/// Resources that need provider-level data (clients, credentials)
pub trait ResourceWithConfigure: Resource {
    fn configure(&self, req: ConfigureRequest, resp: &mut ConfigureResponse);
}

/// Resources that validate configured values before planning
pub trait ResourceWithValidateConfig: Resource {
    fn validate_config(
        &self,
        req: &ValidateConfigRequest<Self::Model>,
        resp: &mut ValidateConfigResponse,
    );
}

/// Resources that can adopt existing remote objects by identifier
#[async_trait]
pub trait ResourceWithImportState: Resource {
    async fn import_state(
        &self,
        req: ImportStateRequest,
        resp: &mut ImportStateResponse<Self::Model>,
    );
}
