//! Run coordination
//!
//! - Cancellable pacing between TWAP submissions
//! - Signal handling that cancels an in-progress run

pub mod pacing;
pub mod shutdown;

pub use pacing::{CancellablePacer, Pacer, PauseOutcome, RecordingPacer};
pub use shutdown::{spawn_signal_listener, wait_for_signal, ShutdownSignal};
