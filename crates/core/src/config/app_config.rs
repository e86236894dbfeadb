use crate::config::{optional_env, ConfigError, ConfigSource, IntegrationCredentials};
use crate::platform::{Platform, DEFAULT_EXCLUSIVE_PLATFORMS};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

pub const ENV_ENVIRONMENT: &str = "SMC_ENV";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_LOG_LEVEL: &str = "SMC_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SMC_LOG_FORMAT";
pub const ENV_EXCLUSIVE_PLATFORMS: &str = "SMC_EXCLUSIVE_PLATFORMS";

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::invalid_value("log_format", s, "text or json")),
        }
    }
}

/// Values given on the command line. Each one replaces its environment
/// variable entirely, so the variable is neither read nor validated.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub exclusive_platforms: Option<Vec<Platform>>,
}

impl ConfigOverrides {
    /// Flags that were actually given, keyed by config field
    fn flags(&self) -> BTreeMap<&'static str, &'static str> {
        let mut flags = BTreeMap::new();
        if self.database_url.is_some() {
            flags.insert("database_url", "--database-url");
        }
        if self.exclusive_platforms.is_some() {
            flags.insert("exclusive_platforms", "--platform");
        }
        flags
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        })
    }
}

/// Tooling configuration, loaded once at start-up and passed down explicitly
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database_url: Option<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Platforms whose active connections get a partial unique index
    pub exclusive_platforms: Vec<Platform>,
    pub integrations: IntegrationCredentials,
    command_line: BTreeMap<&'static str, &'static str>,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            environment: Environment::Development,
            database_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            exclusive_platforms: DEFAULT_EXCLUSIVE_PLATFORMS.to_vec(),
            integrations: IntegrationCredentials::default(),
            command_line: BTreeMap::new(),
        }
    }

    /// Load from the environment with command line values taking precedence,
    /// then validate the merged result once.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let config = Self::read_env(overrides)?;
        config.validate()?;
        Ok(config)
    }

    fn read_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        config.command_line = overrides.flags();

        if let Some(env_str) = optional_env(ENV_ENVIRONMENT)? {
            config.environment = env_str.parse()?;
        }

        config.database_url = match overrides.database_url {
            Some(url) => Some(url),
            None => optional_env(ENV_DATABASE_URL)?,
        };

        if let Some(log_level) = optional_env(ENV_LOG_LEVEL)? {
            config.log_level = log_level.to_lowercase();
        }

        if let Some(format) = optional_env(ENV_LOG_FORMAT)? {
            config.log_format = format.parse()?;
        }

        if let Some(platforms) = overrides.exclusive_platforms {
            config.exclusive_platforms = platforms;
        } else if let Some(platforms) = optional_env(ENV_EXCLUSIVE_PLATFORMS)? {
            config.exclusive_platforms = Platform::parse_list(&platforms)?;
        }

        config.integrations = IntegrationCredentials::from_env()?;

        Ok(config)
    }

    /// Create configuration for testing
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            log_level: "warn".to_string(),
            ..Self::new()
        }
    }

    /// Override the database URL, e.g. from a command line flag
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Override the exclusive platform list
    pub fn with_exclusive_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.exclusive_platforms = platforms;
        self
    }

    /// Database URL or a configuration error naming the variable to set
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or_else(|| {
            ConfigError::missing_required(
                "database_url",
                format!("Set {} or pass --database-url", ENV_DATABASE_URL),
            )
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::load(ConfigOverrides::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".to_string(),
                value: self.log_level.clone(),
                expected: format!("one of: {}", VALID_LOG_LEVELS.join(", ")),
            });
        }

        if self.exclusive_platforms.is_empty() {
            return Err(ConfigError::validation_failed(
                "at least one exclusive platform must be configured",
            ));
        }

        let mut seen = HashSet::new();
        for platform in &self.exclusive_platforms {
            if !seen.insert(platform) {
                return Err(ConfigError::validation_failed(format!(
                    "platform '{}' is listed more than once",
                    platform
                )));
            }
        }

        if self.environment.is_production() && self.database_url.is_none() {
            return Err(ConfigError::missing_required(
                "database_url",
                format!("{} is required in production", ENV_DATABASE_URL),
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();

        sources.insert(
            "environment".to_string(),
            ConfigSource::env_or_default(ENV_ENVIRONMENT, "development"),
        );
        sources.insert(
            "database_url".to_string(),
            ConfigSource::env_or_default(ENV_DATABASE_URL, "unset"),
        );
        sources.insert(
            "log_level".to_string(),
            ConfigSource::env_or_default(ENV_LOG_LEVEL, "info"),
        );
        sources.insert(
            "log_format".to_string(),
            ConfigSource::env_or_default(ENV_LOG_FORMAT, "text"),
        );
        sources.insert(
            "exclusive_platforms".to_string(),
            ConfigSource::env_or_default(ENV_EXCLUSIVE_PLATFORMS, "facebook,instagram"),
        );

        for (field, flag) in &self.command_line {
            sources.insert(field.to_string(), ConfigSource::CommandLine(flag.to_string()));
        }

        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for var in [
            ENV_ENVIRONMENT,
            ENV_DATABASE_URL,
            ENV_LOG_LEVEL,
            ENV_LOG_FORMAT,
            ENV_EXCLUSIVE_PLATFORMS,
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_from_empty_environment() {
        clear_env();
        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.exclusive_platforms,
            vec![Platform::Facebook, Platform::Instagram]
        );
        assert!(config.config_sources()["environment"].is_default());
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear_env();
        env::set_var(ENV_ENVIRONMENT, "prod");
        env::set_var(ENV_DATABASE_URL, "postgres://app@db.internal/social");
        env::set_var(ENV_LOG_FORMAT, "json");
        env::set_var(ENV_EXCLUSIVE_PLATFORMS, "facebook,instagram,tiktok");

        let config = AppConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://app@db.internal/social")
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.exclusive_platforms.len(), 3);
    }

    #[test]
    #[serial]
    fn test_production_requires_database_url() {
        clear_env();
        env::set_var(ENV_ENVIRONMENT, "production");
        let result = AppConfig::from_env();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequired { ref field, .. }) if field == "database_url"
        ));
    }

    #[test]
    #[serial]
    fn test_unknown_platform_in_environment_is_rejected() {
        clear_env();
        env::set_var(ENV_EXCLUSIVE_PLATFORMS, "facebook,friendster");
        let result = AppConfig::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_database_url_flag_satisfies_production() {
        clear_env();
        env::set_var(ENV_ENVIRONMENT, "production");
        let result = AppConfig::load(ConfigOverrides {
            database_url: Some("postgres://smc@db/social".to_string()),
            ..Default::default()
        });
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database_url.as_deref(), Some("postgres://smc@db/social"));
        assert_eq!(
            config.config_sources()["database_url"],
            ConfigSource::CommandLine("--database-url".to_string())
        );
    }

    #[test]
    #[serial]
    fn test_platform_flag_replaces_invalid_environment_list() {
        clear_env();
        env::set_var(ENV_EXCLUSIVE_PLATFORMS, "facebook,friendster");
        let result = AppConfig::load(ConfigOverrides {
            exclusive_platforms: Some(vec![Platform::TikTok]),
            ..Default::default()
        });
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.exclusive_platforms, vec![Platform::TikTok]);
        assert!(config.config_sources()["database_url"].is_default());
    }

    #[test]
    #[serial]
    fn test_flag_overrides_environment_database_url() {
        clear_env();
        env::set_var(ENV_DATABASE_URL, "postgres://env@db/social");
        let config = AppConfig::load(ConfigOverrides {
            database_url: Some("postgres://flag@db/social".to_string()),
            ..Default::default()
        })
        .unwrap();
        clear_env();

        assert_eq!(config.database_url.as_deref(), Some("postgres://flag@db/social"));
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicate_platforms() {
        let config = AppConfig::testing().with_exclusive_platforms(vec![]);
        assert!(config.validate().is_err());

        let config = AppConfig::testing()
            .with_exclusive_platforms(vec![Platform::Facebook, Platform::Facebook]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = AppConfig::testing();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_database_url() {
        let config = AppConfig::testing();
        assert!(config.require_database_url().is_err());

        let config = config.with_database_url("postgres://u@h/d");
        assert_eq!(config.require_database_url().unwrap(), "postgres://u@h/d");
    }
}
