//! Trade simulator: a single-pass, bar-by-bar state machine over one symbol.
//!
//! States are Flat, Long and Short. Each bar runs, in order:
//!
//! 1. Cancellation check
//! 2. Exit handling for an open position
//! 3. Entry handling (skipped on the final bar)
//! 4. Forced liquidation on the final bar
//! 5. Equity point append
//!
//! A reversal is a close followed by an open within the same bar; the state
//! never moves directly between Long and Short.

pub mod config;
pub mod error;
pub mod simulator;

pub use config::{DirectionPolicy, SimulationConfig};
pub use error::{InsufficientFundsError, SimulationError};
pub use simulator::{simulate, SimulationOutput};
