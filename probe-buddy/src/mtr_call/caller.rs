use std::borrow::Cow;
use std::net::Ipv4Addr;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use tokio::process::Command;

use super::report::{parse_trace_report, Hop};

/// Base config for calling mtr
#[derive(Debug, Clone)]
pub struct Caller {
    bin_path: String,
    cycles: u16,
}

impl Caller {
    pub fn new(bin_path: String, cycles: u16) -> Self {
        Caller { bin_path, cycles }
    }

    /// Traces the route to `addr`, with AS lookups for each hop.
    pub async fn trace(&self, addr: Ipv4Addr) -> Result<Vec<Hop>> {
        let mut cmd = self.make_command(addr);
        if log_enabled!(Debug) {
            let args: Vec<Cow<'_, str>> = cmd
                .as_std()
                .get_args()
                .map(|os_str| os_str.to_string_lossy())
                .collect();
            debug!("Calling mtr with arguments: {}", args.join(" "));
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run mtr for {}", addr))?;
        if !output.status.success() {
            bail!(
                "mtr call for {} exited with non-successful status {:?}: {}",
                addr,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        parse_trace_report(&raw).with_context(|| format!("Unexpected mtr report for {}", addr))
    }

    fn make_command(&self, addr: Ipv4Addr) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.arg("--json")
            .arg("-z")
            .arg(format!("-c{}", self.cycles))
            .arg(addr.to_string());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}
