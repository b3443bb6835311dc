use clap::Args;

pub use self::caller::Caller;
pub use self::report::{as_path_of, last_hop_rtt, Hop};

mod caller;
mod report;

#[derive(Args, Clone, Debug)]
#[group(id = "mtr")]
pub struct Params {
    /// FQ path to mtr binary
    #[arg(long, default_value = "/usr/bin/mtr", env = "MTR_BIN_PATH")]
    mtr_bin_path: String,

    /// Pings sent per hop, the hop average is taken over these
    #[arg(long, default_value = "5", env = "MTR_CYCLES")]
    mtr_cycles: u16,
}

impl Params {
    pub fn to_caller(&self) -> Caller {
        Caller::new(self.mtr_bin_path.clone(), self.mtr_cycles)
    }
}
