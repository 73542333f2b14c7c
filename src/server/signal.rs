//! Termination signals and the grace cutoff
//!
//! The first SIGTERM/SIGINT starts a graceful shutdown. A [`GraceCutoff`]
//! lets a later event (such as a second signal) end the grace period early
//! through the matching [`CutoffSignal`].

use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Signal that asked the process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Terminate,
    Interrupt,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Wait for SIGTERM or SIGINT
///
/// Fails if the signal handlers cannot be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<TerminationSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let received = tokio::select! {
        _ = sigterm.recv() => TerminationSignal::Terminate,
        _ = sigint.recv() => TerminationSignal::Interrupt,
    };
    info!(signal = %received, "Received termination signal");
    Ok(received)
}

/// Wait for Ctrl+C (non-Unix)
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<TerminationSignal> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    Ok(TerminationSignal::Interrupt)
}

/// Triggers the end of the grace period
pub struct GraceCutoff {
    sender: watch::Sender<bool>,
}

impl GraceCutoff {
    pub fn cut(&self) {
        self.sender.send_replace(true);
        info!("Grace period cutoff triggered");
    }
}

/// Completes once the paired [`GraceCutoff`] fires or is dropped
#[derive(Clone)]
pub struct CutoffSignal {
    receiver: watch::Receiver<bool>,
}

impl CutoffSignal {
    pub async fn wait(&mut self) {
        // Sender dropped, treat as cut
        let _ = self.receiver.wait_for(|cut| *cut).await;
    }

    /// Check without waiting
    pub fn is_cut(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Create a cutoff pair
pub fn grace_cutoff() -> (GraceCutoff, CutoffSignal) {
    let (sender, receiver) = watch::channel(false);
    (GraceCutoff { sender }, CutoffSignal { receiver })
}
