//! `relic-tool`: command-line front end over a resource project.

mod args;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use crate::args::Args;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    relic_core::init();

    let args = Args::parse();
    let mut store = match commands::open_store(&args) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open project {}: {e}", args.project.display());
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = commands::run(&args.command, &mut store, &mut stdout) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
