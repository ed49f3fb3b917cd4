//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals to internal events
//! - Trigger graceful shutdown on the first signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before the HTTP listener is bound
//! - A repeated SIGTERM/SIGINT ends the process without draining unless
//!   configured otherwise; the exit itself happens in `main` so the log file
//!   is flushed first

use std::future::Future;

use tokio::sync::mpsc;

use crate::lifecycle::shutdown::ShutdownCoordinator;

/// Exit status used when a repeated signal cuts the drain short.
pub const FORCED_EXIT_CODE: u8 = 1;

/// Termination signals that start a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "interrupt"),
            ShutdownSignal::Terminate => write!(f, "terminated"),
        }
    }
}

/// Why [`watch_signals`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The source closed; no further signals will be handled.
    SourceClosed,
    /// A signal arrived while already draining and forced exit is enabled.
    ForceExit(ShutdownSignal),
}

/// Anything that yields shutdown signals. `None` means no more will arrive.
pub trait SignalSource {
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send;
}

/// Signals delivered by the operating system.
#[derive(Debug)]
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalListener {
    /// Install the handlers. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {})
    }
}

impl SignalSource for SignalListener {
    #[cfg(unix)]
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send {
        async move {
            tokio::select! {
                received = self.interrupt.recv() => received.map(|_| ShutdownSignal::Interrupt),
                received = self.terminate.recv() => received.map(|_| ShutdownSignal::Terminate),
            }
        }
    }

    #[cfg(not(unix))]
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send {
        async move {
            tokio::signal::ctrl_c()
                .await
                .ok()
                .map(|_| ShutdownSignal::Interrupt)
        }
    }
}

impl SignalSource for mpsc::Receiver<ShutdownSignal> {
    fn recv(&mut self) -> impl Future<Output = Option<ShutdownSignal>> + Send {
        mpsc::Receiver::recv(self)
    }
}

/// Drive shutdown from a signal source.
///
/// The first signal triggers the coordinator. Later signals either end the
/// watch with [`WatchOutcome::ForceExit`] (`force_exit_on_repeat`) or are
/// logged and ignored.
pub async fn watch_signals<S>(
    mut signals: S,
    shutdown: ShutdownCoordinator,
    force_exit_on_repeat: bool,
) -> WatchOutcome
where
    S: SignalSource,
{
    let Some(signal) = signals.recv().await else {
        tracing::debug!("Signal source closed before any signal arrived");
        return WatchOutcome::SourceClosed;
    };
    shutdown.trigger(signal);

    while let Some(signal) = signals.recv().await {
        if force_exit_on_repeat {
            tracing::error!(%signal, "Repeated shutdown signal, exiting without draining");
            return WatchOutcome::ForceExit(signal);
        }
        tracing::warn!(%signal, state = ?shutdown.state(), "Shutdown already in progress, ignoring signal");
    }
    WatchOutcome::SourceClosed
}
