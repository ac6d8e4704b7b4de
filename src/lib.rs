pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod postgresflex;
pub mod resource;
pub mod schema;
pub mod utils;

// Re-export commonly used types for easier access
pub use client::{HttpPostgresFlexClient, PostgresFlexApi};
pub use config::{ProviderConfig, ProviderData};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{AppError, AppResult};
pub use postgresflex::{DatabaseModel, DatabaseResource};
