use anyhow::Result;
use as_ping::helpers::{bootstrap, logging};
use clap::Parser;

/// Subcommands and the scan orchestration behind them.
mod cmd_logic;
mod fping_call;
mod mtr_call;
/// Probing of a single prefix, independent of how the tools are run.
mod probe;
/// Announced prefixes, AS names and country rankings over HTTP.
mod registry;
/// Bounded-parallel probing of many prefixes.
mod schedule;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(flatten)]
    logging: logging::Params,

    #[command(subcommand)]
    command: cmd_logic::Commands,
}

fn main() -> Result<()> {
    bootstrap::run(Cli::parse, |cli: &Cli| &cli.logging, do_run)
}

fn do_run(cli: Cli) -> Result<()> {
    cmd_logic::handle(cli.command)
}
