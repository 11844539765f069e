use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use alice_host::{Cli, HostConfig, run_headless, shell, util};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The config may carry the log filter, so it loads before tracing starts.
    let config = HostConfig::load(cli.config.as_deref());
    let filter = config.as_ref().ok().and_then(|c| c.log_filter.clone());
    util::init_tracing(filter.as_deref());
    util::install_panic_hook();

    let result = config.and_then(|mut config| {
        cli.apply(&mut config);
        run(&cli, config)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: HostConfig) -> Result<()> {
    let wasm = std::fs::read(&cli.module)
        .with_context(|| format!("failed to read module {}", cli.module.display()))?;

    tracing::info!(
        module = %cli.module.display(),
        headless = cli.headless,
        fuel = ?config.frame_fuel,
        "starting"
    );

    if cli.headless {
        run_headless(&config, &wasm)?;
        Ok(())
    } else {
        shell::run(config, wasm)
    }
}
