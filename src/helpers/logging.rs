use anyhow::{Context, Result};
use clap::Args;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use flexi_logger::{colored_default_format, detailed_format, Logger, LoggerHandle, WriteMode};
use log::Level;

/// HTTP internals are chatty on debug and rarely what you're looking for
const QUIET_MODULES: &str = "hyper=warn, reqwest=warn, rustls=warn";

#[derive(Args, Debug)]
#[group(id = "logging")]
pub struct Params {
    #[clap(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Use a flexi_logger configuration file
    #[arg(long = "log-spec")]
    use_log_spec: bool,

    /// Path to log spec
    #[arg(long, value_name = "TOML FILE", default_value = "logspec.toml", env = "LOG_SPEC_FILE")]
    log_spec_file: std::path::PathBuf,
}

impl Params {
    fn default_spec(&self) -> String {
        // log_level() returns None iff verbosity < 0, i.e. being most quiet seems reasonable
        let cli_level = self.verbose.log_level().unwrap_or(Level::Error);
        format!("{}, {}", cli_level, QUIET_MODULES)
    }
}

/// Starts logging to stderr. stdout is reserved for the JSON report.
pub fn configure_from(params: &Params) -> Result<LoggerHandle> {
    let log_builder = Logger::try_with_env_or_str(params.default_spec())
        .context("Failed to parse logger spec from env RUST_LOG or cli level")?
        .log_to_stderr()
        .write_mode(WriteMode::Async)
        .format_for_stderr(colored_default_format)
        .format_for_files(detailed_format);

    if params.use_log_spec {
        log_builder
            .start_with_specfile(&params.log_spec_file)
            .with_context(|| format!("Failed to start logger with specfile {:?}", params.log_spec_file))
    } else {
        log_builder
            .start()
            .context("Failed to start logger handle w/o specfile")
    }
}
