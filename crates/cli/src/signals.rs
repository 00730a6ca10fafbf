#![forbid(unsafe_code)]

//! Termination-signal wiring.
//!
//! The handlers do nothing beyond resolving a future; all real shutdown
//! work happens cooperatively in the trigger loop once the cancellation
//! token flips.

use tokio::signal::unix::{SignalKind, signal};
use tracing::debug;

/// Resolve when SIGINT or SIGTERM arrives.
pub async fn shutdown_signal() -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = interrupt.recv() => debug!("received SIGINT"),
        _ = terminate.recv() => debug!("received SIGTERM"),
    }
    Ok(())
}
