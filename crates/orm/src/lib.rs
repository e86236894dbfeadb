//! # smc-orm: database layer for social media connection tooling
//!
//! Strict PostgreSQL connection strings, SQL identifier safety, the
//! idempotent connection-exclusivity migration and a small repository for
//! `social_media_connections` rows.

pub mod connection;
pub mod error;
pub mod migrations;
pub mod models;
pub mod security;

pub use connection::{close_quietly, connect, ConnectionString};
pub use error::*;
pub use migrations::*;
pub use models::*;
