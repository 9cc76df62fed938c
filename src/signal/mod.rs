//! Shutdown signal handling for the resident `serve` process
//!
//! On the first SIGINT/SIGTERM the process is asked to stop; a second one
//! requests an immediate exit.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Exit code after an interrupt
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Polling interval while waiting for a signal
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: stop gracefully
    Shutdown,
    /// Second signal: exit immediately
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

/// Counts received signals
#[derive(Debug, Default)]
pub struct SignalState {
    signal_count: AtomicU8,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a signal (SIGINT/SIGTERM)
    pub fn handle_signal(&self) -> SignalAction {
        match self.signal_count.fetch_add(1, Ordering::SeqCst) {
            0 => SignalAction::Shutdown,
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.signal_count.load(Ordering::SeqCst) > 0
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }
}

/// Installs the process signal handler and waits on it
pub struct ShutdownSignal {
    state: Arc<SignalState>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the handlers. Must be called once at program startup.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::Shutdown => {
                warn!("received interrupt, shutting down");
            }
            SignalAction::ImmediateExit => {
                eprintln!("\nReceived second interrupt, exiting immediately...");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            SignalAction::Ignore => {}
        })
    }

    /// Block until a shutdown is requested.
    pub fn wait(&self) {
        while !self.state.is_shutdown_requested() {
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
