mod app;
mod cli;
mod trigger;

use batchgate_core::config::{Config, LogFormat};
use batchgate_core::lifecycle::logging::{LogOutput, init_logging};
use clap::Parser;
use cli::{Cli, Command, RunArgs, TriggerArgs};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => cmd_run(args),
        Command::Trigger(args) => cmd_trigger(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    // Peek at the config file for logging settings before the subscriber exists
    let loaded = Config::load(&args.config);
    let (format, output) = loaded
        .as_ref()
        .map(|c| (c.log_format, LogOutput::from_config(c)))
        .unwrap_or((LogFormat::default(), LogOutput::Stderr));
    let _guard = init_logging(&args.log_level, format, &output);
    let config = app::resolve_config(&args, loaded);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let application = app::Application::build(config)?;
        application.serve().await
    })
}

fn cmd_trigger(args: TriggerArgs) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(trigger::run(&args))
}
