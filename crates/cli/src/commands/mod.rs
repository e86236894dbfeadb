pub mod config;
pub mod db;
pub mod migrate;

use smc_core::{AppConfig, CoreError};
use smc_orm::{ConnectionString, OrmError};

/// Map database-layer errors onto the operator-facing error type
pub(crate) fn orm_error(err: OrmError) -> CoreError {
    match err {
        OrmError::Migration(msg) => CoreError::migration(msg),
        OrmError::Configuration(msg) | OrmError::Validation(msg) => CoreError::validation(msg),
        other => CoreError::database(other.to_string()),
    }
}

/// Resolve and strictly parse the configured database URL
pub(crate) fn database_target(config: &AppConfig) -> Result<ConnectionString, CoreError> {
    let url = config.require_database_url()?;
    ConnectionString::parse(url)
        .map_err(|e| CoreError::validation(format!("Invalid database URL: {}", e)))
}
