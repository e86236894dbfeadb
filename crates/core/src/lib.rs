//! # smc-core
//!
//! Shared foundation for the social media connection tooling: configuration
//! loaded once from the environment, the core error type, logging setup and
//! the [`Platform`] enumeration every other crate keys on.

pub mod config;
pub mod errors;
pub mod logging;
pub mod platform;

pub use config::{
    AppConfig, AppConfigTrait, ConfigError, ConfigOverrides, ConfigSource, Environment,
    IntegrationCredentials, LogFormat,
};
pub use errors::CoreError;
pub use logging::{init_logging, LoggingConfig};
pub use platform::{Platform, DEFAULT_EXCLUSIVE_PLATFORMS};
