//! Migration System
//!
//! Idempotent, transactional schema migrations. The only shipped plan is the
//! connection exclusivity migration; the step/plan/runner types are general.

pub mod definitions;
pub mod exclusivity;
pub mod executor;
pub mod runner;
pub mod schema_builder;
pub mod status;

pub use definitions::*;
pub use exclusivity::{index_name, ExclusivityConfig, CONNECTIONS_TABLE, LEGACY_CONSTRAINT};
pub use executor::SchemaExecutor;
pub use runner::{apply_steps, MigrationRunner};
pub use schema_builder::{SchemaBuilder, TableBuilder};
pub use status::{inspect, inspect_status, IndexStatus, SchemaStatus};
