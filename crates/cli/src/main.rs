mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::*;
use smc_core::{init_logging, AppConfig, ConfigOverrides, CoreError, LoggingConfig, Platform};

#[derive(Parser)]
#[command(name = "smc")]
#[command(version)]
#[command(about = "Schema tooling for social media account connections")]
struct Cli {
    /// Database URL, overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schema migrations
    Migrate {
        #[command(subcommand)]
        migrate_command: MigrateCommands,
    },

    /// Database connectivity
    Db {
        #[command(subcommand)]
        db_command: DbCommands,
    },

    /// Inspect resolved configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Enforce one active connection per account on exclusive platforms
    Exclusivity {
        /// Exclusive platform, repeatable (defaults to SMC_EXCLUSIVE_PLATFORMS)
        #[arg(long = "platform")]
        platforms: Vec<Platform>,

        /// Print the SQL without connecting
        #[arg(long)]
        dry_run: bool,

        /// Emit a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Show whether the exclusivity migration has been applied
    Status {
        #[arg(long = "platform")]
        platforms: Vec<Platform>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Connect, ping, and report the server version
    Check,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print configuration with secrets masked
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Command line values replace their environment variables before validation
fn load_config(cli: &Cli) -> Result<AppConfig, CoreError> {
    let platforms = match &cli.command {
        Commands::Migrate {
            migrate_command:
                MigrateCommands::Exclusivity { platforms, .. }
                | MigrateCommands::Status { platforms, .. },
        } if !platforms.is_empty() => Some(platforms.clone()),
        _ => None,
    };

    Ok(AppConfig::load(ConfigOverrides {
        database_url: cli.database_url.clone(),
        exclusive_platforms: platforms,
    })?)
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config = load_config(&cli)?;

    init_logging(LoggingConfig::from_app_config(&config))?;
    tracing::debug!(environment = ?config.environment, "configuration loaded");

    match cli.command {
        Commands::Migrate { migrate_command } => match migrate_command {
            MigrateCommands::Exclusivity { dry_run, json, .. } => {
                migrate::exclusivity(&config, dry_run, json).await?;
            }
            MigrateCommands::Status { json, .. } => {
                migrate::status(&config, json).await?;
            }
        },
        Commands::Db { db_command } => match db_command {
            DbCommands::Check => {
                db::check(&config).await?;
            }
        },
        Commands::Config { config_command } => match config_command {
            ConfigCommands::Show => {
                config::show(&config)?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_migrate_exclusivity_arguments() {
        let cli = Cli::try_parse_from([
            "smc",
            "migrate",
            "exclusivity",
            "--platform",
            "facebook",
            "--platform",
            "twitter",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Migrate {
                migrate_command:
                    MigrateCommands::Exclusivity {
                        platforms,
                        dry_run,
                        json,
                    },
            } => {
                assert_eq!(platforms, vec![Platform::Facebook, Platform::X]);
                assert!(dry_run);
                assert!(!json);
            }
            _ => panic!("expected migrate exclusivity"),
        }
    }

    #[test]
    fn test_global_database_url_flag() {
        let cli = Cli::try_parse_from([
            "smc",
            "db",
            "check",
            "--database-url",
            "postgres://smc@db/social",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("postgres://smc@db/social"));
        assert!(matches!(
            cli.command,
            Commands::Db {
                db_command: DbCommands::Check
            }
        ));
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["smc", "migrate", "status", "--platform", "myspace"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["smc"]).is_err());
        assert!(Cli::try_parse_from(["smc", "migrate"]).is_err());
    }

    #[test]
    #[serial]
    fn test_database_url_flag_satisfies_production_environment() {
        env::set_var("SMC_ENV", "production");
        env::remove_var("DATABASE_URL");
        let cli = Cli::try_parse_from([
            "smc",
            "--database-url",
            "postgres://smc@db/social",
            "config",
            "show",
        ])
        .unwrap();
        let result = load_config(&cli);
        env::remove_var("SMC_ENV");

        let config = result.unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://smc@db/social"));
        config::show(&config).unwrap();
    }

    #[test]
    #[serial]
    fn test_platform_flags_override_environment_list() {
        env::set_var("SMC_EXCLUSIVE_PLATFORMS", "facebook,facebook");
        let cli = Cli::try_parse_from([
            "smc",
            "migrate",
            "exclusivity",
            "--platform",
            "youtube",
            "--dry-run",
        ])
        .unwrap();
        let result = load_config(&cli);
        env::remove_var("SMC_EXCLUSIVE_PLATFORMS");

        assert_eq!(result.unwrap().exclusive_platforms, vec![Platform::YouTube]);
    }

    #[test]
    #[serial]
    fn test_environment_list_used_without_platform_flags() {
        env::set_var("SMC_EXCLUSIVE_PLATFORMS", "tiktok");
        let cli = Cli::try_parse_from(["smc", "migrate", "status"]).unwrap();
        let result = load_config(&cli);
        env::remove_var("SMC_EXCLUSIVE_PLATFORMS");

        assert_eq!(result.unwrap().exclusive_platforms, vec![Platform::TikTok]);
    }
}
