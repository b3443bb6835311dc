use clap::Args;

pub use self::caller::Caller;
pub use self::report::SweepSummary;

mod caller;
mod report;

#[derive(Args, Clone, Debug)]
#[group(id = "fping")]
pub struct Params {
    /// FQ path to fping binary
    #[arg(long, default_value = "/usr/bin/fping", env = "FPING_BIN_PATH")]
    fping_bin_path: String,

    /// Echo requests sent to each address of a prefix
    #[arg(long, default_value = "5", env = "FPING_COUNT")]
    fping_count: u16,

    /// How long to wait for each individual reply
    #[arg(long, default_value = "1000", env = "FPING_TIMEOUT_MS")]
    fping_timeout_ms: u32,
}

impl Params {
    pub fn to_caller(&self) -> Caller {
        Caller::new(self.fping_bin_path.clone(), self.fping_count, self.fping_timeout_ms)
    }
}
