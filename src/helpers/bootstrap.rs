use std::time::Duration;

use anyhow::{Context, Result};
use human_panic::setup_panic;
use log::debug;

use crate::helpers::logging;

/// Common startup for the binaries: panic handler, `.env`, CLI, logging and the Tokio runtime.
/// `fn_run` is called with the runtime entered, so it may spawn tasks.
pub fn run<CliType>(
    fn_cli_parse: fn() -> CliType,
    fn_extract_logging: fn(&CliType) -> &logging::Params,
    fn_run: fn(CliType) -> Result<()>,
) -> Result<()> {
    setup_panic!();
    // Needs to happen before parsing, since the CLI reads defaults from the environment
    let env_found = match dotenvy::dotenv() {
        Ok(_) => true,
        Err(env_err) if env_err.not_found() => false,
        Err(env_err) => return Err(env_err).context("Failed to load `.env` file"),
    };

    let cli = fn_cli_parse();
    let logger_handle = logging::configure_from(fn_extract_logging(&cli))?;
    if !env_found {
        debug!("No `.env` file found (recursively), using CLI and environment only.");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start Tokio runtime")?;
    let guard = runtime.enter();

    let command_result = fn_run(cli);
    drop(guard);

    // Probe processes are killed on drop, so this is only a grace period for in-flight HTTP
    debug!("Waiting up to 5 seconds for remaining tasks to finish");
    runtime.shutdown_timeout(Duration::from_secs(5));

    // Important with non-direct write mode
    // Handle needs to be kept alive until end of program
    logger_handle.flush();

    command_result
}
