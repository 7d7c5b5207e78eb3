mod fibonacci;
mod orderbook;
mod spike;

pub use fibonacci::{FibonacciLevel, LevelProximity, SignalType, TrendDirection};
pub use orderbook::{
    OrderBook, OrderBookAnalysis, OrderBookEntry, OrderWall, VolumeZone, WallSide,
};
pub use spike::{TrackedSpike, VolumeSpike};

pub(crate) use fibonacci::level_rank;
