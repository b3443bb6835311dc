use std::borrow::Cow;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use ipnet::Ipv4Net;
use log::Level::Debug;
use log::{debug, log_enabled, trace};
use tokio::process::Command;

use super::report::{parse_sweep_report, SweepSummary};

/// Base config for calling fping
#[derive(Debug, Clone)]
pub struct Caller {
    bin_path: String,
    count: u16,
    timeout_ms: u32,
}

impl Caller {
    pub fn new(bin_path: String, count: u16, timeout_ms: u32) -> Self {
        Caller {
            bin_path,
            count,
            timeout_ms,
        }
    }

    /// Pings every address from the network to the broadcast address of `net`.
    pub async fn sweep(&self, net: &Ipv4Net) -> Result<SweepSummary> {
        let mut cmd = self.make_command(net);
        if log_enabled!(Debug) {
            let args: Vec<Cow<'_, str>> = cmd
                .as_std()
                .get_args()
                .map(|os_str| os_str.to_string_lossy())
                .collect();
            debug!("Calling fping with arguments: {}", args.join(" "));
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run fping for {}", net))?;

        // 1 just means that some targets were unreachable
        match output.status.code() {
            Some(0) | Some(1) => trace!("fping for {} exited with {}", net, output.status),
            _ => bail!(
                "fping call for {} exited with non-successful status {:?}",
                net,
                output.status
            ),
        }

        // with -q, all the interesting output goes to stderr
        let raw = String::from_utf8_lossy(&output.stderr);
        parse_sweep_report(&raw).with_context(|| format!("Unexpected fping report for {}", net))
    }

    fn make_command(&self, net: &Ipv4Net) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.arg("-s")
            .arg("-q")
            .arg(format!("-c{}", self.count))
            .arg(format!("-t{}", self.timeout_ms))
            .arg("-g")
            .arg(net.network().to_string())
            .arg(net.broadcast().to_string());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}
