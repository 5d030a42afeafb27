mod cli;
mod config;
mod formulas;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Formula(args)) => formulas::print_formulas(&cli.run, args),
        Some(Command::Config) => run::print_config(&cli.run),
        None => run::run(cli.run),
    }
}
