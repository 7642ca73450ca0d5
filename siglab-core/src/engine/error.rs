//! Simulator error types.
//!
//! `InsufficientFundsError` is recoverable: the entry is skipped, the error is
//! recorded in the output and the run continues. `SimulationError` is fatal and
//! no partial ledger is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PositionSide;
use crate::validation::ValidationError;

/// A qualifying entry that could not be afforded at its bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error(
    "insufficient funds on {date} (bar {bar_index}): {side:?} entry of {quantity} units \
     needs {required:.2}, available {available:.2}"
)]
pub struct InsufficientFundsError {
    pub date: NaiveDate,
    pub bar_index: usize,
    pub side: PositionSide,
    /// Resolved whole-unit quantity (may be 0).
    pub quantity: f64,
    /// Cash needed including the entry fee (for at least one unit when quantity is 0).
    pub required: f64,
    pub available: f64,
}

/// Fatal simulation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error(
        "signal series misaligned with {symbol} prices (last bar {last_date}): \
         {prices} price bars, {entries} entry flags, {exits} exit flags"
    )]
    LengthMismatch {
        symbol: String,
        last_date: NaiveDate,
        prices: usize,
        entries: usize,
        exits: usize,
    },

    #[error("simulation cancelled at bar {bar_index} ({date})")]
    Cancelled { bar_index: usize, date: NaiveDate },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(#[from] ValidationError),
}
