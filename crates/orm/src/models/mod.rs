//! Model System
//!
//! Row types and persistence helpers for the tables the tooling manages.

pub mod social_connection;

pub use social_connection::{ConnectionRepository, NewConnection, SocialMediaConnection};
