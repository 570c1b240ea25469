use std::process::ExitCode;

use clap::Parser;

use fulfillsync_infra::EngineConfig;
use fulfillsync_runner::{run, Cli};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = EngineConfig::from_env();
    fulfillsync_observability::init_with(
        config.as_ref().map(|c| c.log_format).unwrap_or_default(),
    );
    let config = config?;

    let report = run(&cli, &config, std::io::stdout())?;
    Ok(ExitCode::from(fulfillsync_runner::exit_code(&report)))
}
