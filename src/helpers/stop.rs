use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use tokio::select;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Translates termination signals into a [CancellationToken] that running scans observe.
pub struct SignalHandler {
    tok: CancellationToken,
}

pub fn new() -> SignalHandler {
    SignalHandler {
        tok: CancellationToken::new(),
    }
}

impl SignalHandler {
    pub fn subscribe_stop(&self) -> CancellationToken {
        self.tok.clone()
    }

    /// Waits for the first of SIGTERM, SIGINT or SIGHUP and cancels the token.
    /// If the handlers cannot be installed, the token is never cancelled.
    pub async fn wait_for_signal(self) {
        let (mut sigterm, mut sigint, mut sighup) = match install_all() {
            Ok(signals) => signals,
            Err(e) => {
                warn!("Unable to install signal handlers, scans can't be stopped cleanly: {:?}", e);
                return;
            }
        };

        select! {
            _ = sigterm.recv() => info!("Terminated; stopping..."),
            _ = sigint.recv() => info!("Interrupted; stopping..."),
            _ = sighup.recv() => info!("Hangup received; stopping..."), // used by tmux apparently
        }
        self.tok.cancel();
    }
}

fn install_all() -> Result<(Signal, Signal, Signal)> {
    Ok((
        signal(SignalKind::terminate()).context("SIGTERM")?,
        signal(SignalKind::interrupt()).context("SIGINT")?,
        signal(SignalKind::hangup()).context("SIGHUP")?,
    ))
}

/// Joins a task, folding a panic or cancellation of the task into its own error type.
pub async fn flatten<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    match handle.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err),
        Err(err) => Err(anyhow!(err)),
    }
}
