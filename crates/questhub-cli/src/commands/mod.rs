//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod run;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use questhub_core::config::AppConfig;
use questhub_core::error::AppError;
use questhub_database::DatabasePool;

/// QuestHub achievement batch tools
#[derive(Debug, Parser)]
#[command(name = "questhub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay loaded on top of config/default.toml
    #[arg(short, long, env = "QUESTHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Trigger an achievement pipeline once
    Run(run::RunArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &self.env).await,
            Commands::Run(args) => run::execute(args, &self.env, self.format).await,
            Commands::Config(args) => config::execute(args, &self.env, self.format),
        }
    }
}

/// Helper: load configuration for `env`
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
