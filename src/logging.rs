use tracing::{field, info_span, Span};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG` (default "info")
///
/// Panics if a global subscriber is already set; use [`try_init_logging`]
/// where that can happen.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .init();
}

/// Like [`init_logging`] but returns false instead of panicking when a
/// subscriber is already installed
pub fn try_init_logging(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .try_init()
        .is_ok()
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Span carrying the identifiers of the database a lifecycle call works on
///
/// `database_id` may be unknown when the span opens (create); record it with
/// `span.record("database_id", id)` once the service assigns one.
pub fn database_span(operation: &'static str, project_id: &str, instance_id: &str) -> Span {
    info_span!(
        "postgresflex_database",
        operation,
        project_id,
        instance_id,
        database_id = field::Empty,
    )
}
