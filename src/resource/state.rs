use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// A declarative record the driver persists between calls
pub trait StateModel: Clone + Default + Serialize + DeserializeOwned + Send + Sync {
    /// Value of a top-level string attribute, `None` when null or unknown
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Set a top-level string attribute
    fn set_attribute(&mut self, name: &str, value: String) -> AppResult<()>;
}

/// Resource state as seen by the driver
///
/// A null state means the resource does not exist (or no longer exists) and
/// the driver drops it from its records.
#[derive(Debug, Clone, PartialEq)]
pub struct State<M> {
    value: Option<M>,
}

impl<M> Default for State<M> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<M: StateModel> State<M> {
    pub fn null() -> Self {
        Self::default()
    }

    pub fn from_model(model: M) -> Self {
        Self { value: Some(model) }
    }

    pub fn get(&self) -> Option<&M> {
        self.value.as_ref()
    }

    pub fn set(&mut self, model: M) {
        self.value = Some(model);
    }

    /// Drop the resource from state
    pub fn remove_resource(&mut self) {
        self.value = None;
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Set one attribute, starting from an empty record when state is null
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> AppResult<()> {
        self.value
            .get_or_insert_with(M::default)
            .set_attribute(name, value.into())
    }

    pub fn to_json(&self) -> AppResult<Value> {
        match &self.value {
            Some(model) => Ok(serde_json::to_value(model)?),
            None => Ok(Value::Null),
        }
    }

    pub fn from_json(value: Value) -> AppResult<Self> {
        if value.is_null() {
            return Ok(Self::null());
        }
        let model = serde_json::from_value(value).map_err(AppError::Serialization)?;
        Ok(Self::from_model(model))
    }
}
