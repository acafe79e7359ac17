//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use questhub_core::error::AppError;
use questhub_database::connection::mask_password;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,
    /// Validate the merged configuration
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(env)?;
            config.database.url = mask_password(&config.database.url);
            if format == OutputFormat::Json {
                output::print_json(&config);
            } else {
                println!("{:#?}", config);
            }
        }
        ConfigCommand::Validate => match super::load_config(env) {
            Ok(config) => {
                output::print_success(&format!("Configuration for '{}' is valid", env));
                output::print_kv("Database", &mask_password(&config.database.url));
                output::print_kv("Chunk size", &config.batch.chunk_size.to_string());
                output::print_kv("Page size", &config.batch.page_size.to_string());
                output::print_kv("Max attempts", &config.batch.max_attempts.to_string());
                output::print_kv(
                    "Perfect-day schedule",
                    if config.batch.scheduler_enabled {
                        &config.batch.perfect_day_cron
                    } else {
                        "disabled"
                    },
                );
                output::print_kv(
                    "Push endpoint",
                    if config.push.enabled {
                        &config.push.endpoint
                    } else {
                        "disabled"
                    },
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
    }
    Ok(())
}
