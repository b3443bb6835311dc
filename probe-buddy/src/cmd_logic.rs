use anyhow::Result;
use clap::Subcommand;
use log::debug;
use scan_models::FailureReport;

pub mod probe_one;
pub mod scan;

pub fn handle(cmd: Commands) -> Result<()> {
    let command_result = match cmd {
        Commands::Scan(data) => scan::handle(data),
        Commands::Probe(data) => probe_one::handle(data),
    };
    debug!("Finished command execution. Result: {:?}", command_result);
    if let Err(e) = &command_result {
        // stdout always carries exactly one JSON document
        match serde_json::to_string(&FailureReport::new(format!("{:#}", e))) {
            Ok(json) => println!("{}", json),
            Err(ser_err) => debug!("Unable to render failure report: {}", ser_err),
        }
    }
    command_result
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample the prefixes announced by one or more ASes, probe them and group the
    /// alive ones by the AS path that leads there.
    Scan(scan::Params),

    /// Probe a single IPv4 prefix, printing everything that was learned about it.
    Probe(probe_one::Params),
}
