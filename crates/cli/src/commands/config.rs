use smc_core::{AppConfig, AppConfigTrait, ConfigSource, CoreError};
use smc_orm::ConnectionString;

/// Database URL with the password masked; unparseable values are never echoed
fn display_database_url(url: Option<&str>) -> String {
    match url {
        None => "(unset)".to_string(),
        Some(url) => match ConnectionString::parse(url) {
            Ok(parsed) => parsed.masked(),
            Err(e) => format!("(invalid: {})", e),
        },
    }
}

/// `(field, rendered value, source)` for every top-level setting
fn settings(config: &AppConfig) -> Vec<(&'static str, String, String)> {
    let sources = config.config_sources();
    let source = |key: &str| {
        sources
            .get(key)
            .map(ConfigSource::description)
            .unwrap_or_else(|| "unknown".to_string())
    };

    let platforms = config
        .exclusive_platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",");

    vec![
        ("environment", config.environment.to_string(), source("environment")),
        (
            "database_url",
            display_database_url(config.database_url.as_deref()),
            source("database_url"),
        ),
        ("log_level", config.log_level.clone(), source("log_level")),
        ("log_format", config.log_format.to_string(), source("log_format")),
        ("exclusive_platforms", platforms, source("exclusive_platforms")),
    ]
}

pub fn show(config: &AppConfig) -> Result<(), CoreError> {
    println!("Configuration:");
    for (key, value, source) in settings(config) {
        println!("  {:<20} {:<48} [{}]", key, value, source);
    }

    println!("Integrations:");
    for (key, value) in config.integrations.masked_entries() {
        println!("  {:<28} {}", key, value);
    }

    Ok(())
}
