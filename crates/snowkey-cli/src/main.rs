mod command;
mod config;
mod telemetry;

use std::io;

use clap::Parser;
use config::{AllocatorConfig, CliArgs, Command};
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    init_telemetry()?;

    let config = AllocatorConfig::try_from(&args)?;
    if cfg!(debug_assertions) {
        tracing::debug!("Starting with full config: {:#?}", config);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Generate { count } => {
            snowkey::global::install(config.build())?;
            command::generate(snowkey::global::get()?, count, &mut out)
        }
        Command::Decode { ids } => command::decode(&ids, config.epoch, &mut out),
    }
}
