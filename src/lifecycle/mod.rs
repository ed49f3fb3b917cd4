//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Signal handlers → Bind listener → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → ShutdownCoordinator::trigger (first signal only)
//!     Repeated signal → run ends early, main exits with status 1 (configurable)
//!
//! Shutdown (shutdown.rs):
//!     Running → Draining (token cancelled, listener dropped)
//!             → Stopped (drained, or grace period elapsed)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: remaining connections closed after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{DrainOutcome, ShutdownCoordinator, ShutdownState};
pub use signals::{
    watch_signals, ShutdownSignal, SignalListener, SignalSource, WatchOutcome, FORCED_EXIT_CODE,
};
pub use startup::{RunOutcome, StartupError};
