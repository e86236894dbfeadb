//! Structured logging setup.
//!
//! Log lines go to stderr so command output on stdout (including `--json`
//! reports) stays machine readable.

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, LogFormat};
use crate::errors::CoreError;

/// Variable consulted before `RUST_LOG` for a full filter directive
pub const ENV_LOG_FILTER: &str = "SMC_LOG";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Emit one JSON object per event instead of text
    pub json_format: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Explicit filter directive, e.g. "smc_orm=debug,sqlx=warn"
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Derive logging settings from the loaded application config
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json_format: config.log_format == LogFormat::Json,
            include_location: false,
            env_filter: None,
        }
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Directive used when neither `SMC_LOG` nor `RUST_LOG` is set.
    ///
    /// sqlx logs every statement at info, which drowns out migration
    /// progress, so it is capped at warn unless asked for explicitly.
    pub fn default_directive(&self) -> String {
        self.env_filter
            .clone()
            .unwrap_or_else(|| format!("{},sqlx=warn", self.level))
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, CoreError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG_FILTER) {
        return Ok(filter);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(config.default_directive()).map_err(|e| CoreError::Logging {
        message: e.to_string(),
    })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), CoreError> {
    let filter = build_filter(&config)?;

    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init()
    };

    result.map_err(|e| CoreError::Logging {
        message: e.to_string(),
    })?;

    tracing::debug!(
        target: "smc::logging",
        "Logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "json" } else { "text" }
    );

    Ok(())
}
