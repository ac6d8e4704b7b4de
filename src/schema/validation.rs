use crate::error::{AppError, AppResult};
use crate::utils::SEPARATOR;
use uuid::Uuid;

/// String validators attached to schema attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Value must parse as a UUID
    Uuid,
    /// Value must not contain the composite identifier separator
    NoSeparator,
}

impl Validator {
    pub fn validate(&self, value: &str) -> AppResult<()> {
        match self {
            Validator::Uuid => validate_uuid(value),
            Validator::NoSeparator => validate_no_separator(value),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Validator::Uuid => "value must be an UUID",
            Validator::NoSeparator => "value must not contain identifier separator ','",
        }
    }
}

pub fn validate_uuid(value: &str) -> AppResult<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| AppError::Validation(format!("parsing value {:?} as UUID: {}", value, e)))
}

pub fn validate_no_separator(value: &str) -> AppResult<()> {
    if value.contains(SEPARATOR) {
        return Err(AppError::Validation(format!(
            "value {:?} must not contain identifier separator {:?}",
            value, SEPARATOR
        )));
    }
    Ok(())
}
