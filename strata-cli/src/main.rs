//! Strata CLI - command-line interface for Strata migrations.

use clap::Parser;

use strata_cli::cli::Cli;
use strata_cli::commands;
use strata_cli::config::Config;
use strata_cli::context::CliContext;
use strata_cli::error::CliResult;
use strata_cli::logging;
use strata_cli::output::{self, Output};

fn main() {
    logging::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors fail.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::discover(&cwd, cli.global.config.as_deref())?;

    let mut ctx = CliContext::from_args(&cli.global, &config, Output::stdout())?;
    commands::dispatch(&mut ctx, cli.command)
}
