use crate::client::ClientError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Provider-level setup problem: wrong provider data, client construction failure
    Configuration(String),
    /// Malformed identifiers or import id
    Validation(String),
    /// The remote object does not exist (any more)
    NotFound(String),
    /// The create call may have left a remote object behind
    PartialFailure(String),
    RemoteCall(ClientError),
    TypeMismatch(String),
    /// The service answered, but the payload is unusable
    InvalidResponse(String),
    Serialization(serde_json::Error),
    ConfigParse(serde_yaml::Error),
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Configuration(e) => write!(f, "{}", e),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::NotFound(e) => write!(f, "{}", e),
            AppError::PartialFailure(e) => write!(f, "{}", e),
            // Remote text is surfaced verbatim
            AppError::RemoteCall(e) => write!(f, "{}", e),
            AppError::TypeMismatch(e) => write!(f, "{}", e),
            AppError::InvalidResponse(e) => write!(f, "{}", e),
            AppError::Serialization(e) => write!(f, "Serialization error: {}", e),
            AppError::ConfigParse(e) => write!(f, "Configuration parse error: {}", e),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::RemoteCall(e) => Some(e),
            AppError::Serialization(e) => Some(e),
            AppError::ConfigParse(e) => Some(e),
            AppError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        AppError::RemoteCall(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err)
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ConfigParse(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl AppError {
    /// True for the drift-detection path: the remote object is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
