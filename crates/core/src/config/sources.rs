use crate::config::optional_env;

/// Where a configuration value came from, for `config show` style diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
    /// Value given on the command line
    CommandLine(String),
}

impl ConfigSource {
    /// Pick the source for a field backed by a single environment variable.
    ///
    /// Blank values count as unset, matching how the value itself is loaded.
    pub fn env_or_default(var: &str, default: impl Into<String>) -> Self {
        if matches!(optional_env(var), Ok(Some(_))) {
            ConfigSource::EnvVar(var.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::CommandLine(flag) => format!("Command line: {}", flag),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
