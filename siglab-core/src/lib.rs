//! siglab core — price series, indicators, signal generation, sizing,
//! trade simulation and performance analysis.
//!
//! Pipeline for a single run:
//! - `data`: a `DataProvider` supplies a `PriceSeries` (fetched once, immutable)
//! - `signals`: a validated `Strategy` turns the series into a `SignalSeries`
//! - `sizers`: the user's size + size type become a `SizingInstruction`
//! - `engine`: the trade simulator walks the bars once, producing a trade
//!   ledger and one `EquityPoint` per bar
//! - `metrics`: drawdown curve and `PerformanceStats` from the ledger and equity
//!
//! Nothing in the simulation path performs I/O or touches shared mutable state,
//! so independent runs can execute concurrently.

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod signals;
pub mod sizers;
pub mod validation;

pub use validation::ValidationError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a run produces or consumes is Send + Sync,
    /// so batches of runs can be spread across worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::EquityPoint>();
        require_sync::<domain::EquityPoint>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();

        require_send::<signals::Strategy>();
        require_sync::<signals::Strategy>();
        require_send::<signals::StrategyConfig>();
        require_sync::<signals::StrategyConfig>();
        require_send::<signals::SignalSeries>();
        require_sync::<signals::SignalSeries>();

        require_send::<sizers::SizingInstruction>();
        require_sync::<sizers::SizingInstruction>();

        require_send::<engine::SimulationConfig>();
        require_sync::<engine::SimulationConfig>();
        require_send::<engine::SimulationOutput>();
        require_sync::<engine::SimulationOutput>();

        require_send::<metrics::PerformanceStats>();
        require_sync::<metrics::PerformanceStats>();
    }

    /// Architecture contract: signal generation never sees cash, positions or
    /// sizing. `generate_signals` takes only the strategy and the price series.
    #[test]
    fn signal_generation_has_no_portfolio_parameter() {
        fn _check(
            strategy: &signals::Strategy,
            prices: &domain::PriceSeries,
        ) -> signals::SignalSeries {
            signals::generate_signals(strategy, prices)
        }
    }
}
