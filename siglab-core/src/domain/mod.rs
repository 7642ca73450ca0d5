//! Domain types for siglab

pub mod equity;
pub mod position;
pub mod price;
pub mod trade;

pub use equity::{DrawdownPoint, EquityPoint};
pub use position::{Position, PositionSide};
pub use price::{PricePoint, PriceSeries, PriceSeriesError};
pub use trade::TradeRecord;
