// Copyright © 2022 The Radicle Link Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io;

use tracing::{info, instrument};

/// Wait for an interrupt (`SIGINT`, ie. ctrl-c).
///
/// Meant to be awaited once, after all accept loops are spawned. Returning
/// from it is the cue to exit the process. No other signal is intercepted.
#[instrument(name = "wait interrupt")]
pub async fn wait_interrupt() -> io::Result<()> {
    use tokio::signal::unix::*;

    let mut int = signal(SignalKind::interrupt())?;
    int.recv().await;
    info!(signal = ?SignalKind::interrupt(), "exiting due to signal");

    Ok(())
}
