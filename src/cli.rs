//! CLI argument parsing with subcommand architecture.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "batchgate", version, about = "HTTP trigger for batch jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the server (default when no subcommand is given)
    Run(RunArgs),
    /// POST to a running server's trigger endpoint
    Trigger(TriggerArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml", env = "BATCHGATE_CONFIG")]
    pub config: String,

    /// Listen host
    #[arg(long, env = "BATCHGATE_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, env = "BATCHGATE_PORT")]
    pub port: Option<u16>,

    /// Log level
    #[arg(long, default_value = "info", env = "BATCHGATE_LOG_LEVEL")]
    pub log_level: String,

    /// Graceful shutdown timeout in seconds (overrides config)
    #[arg(long)]
    pub shutdown_timeout: Option<u64>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: "config.yaml".to_string(),
            host: None,
            port: None,
            log_level: "info".to_string(),
            shutdown_timeout: None,
        }
    }
}

#[derive(Parser, Debug)]
pub struct TriggerArgs {
    /// Trigger endpoint URL
    #[arg(
        long,
        default_value = "http://localhost:8081/api/jobs/import-products",
        env = "BATCHGATE_TRIGGER_URL"
    )]
    pub url: String,

    /// Number of requests to send
    #[arg(long, default_value = "3")]
    pub count: u32,

    /// Pause between requests in seconds
    #[arg(long, default_value = "1")]
    pub interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,
}
