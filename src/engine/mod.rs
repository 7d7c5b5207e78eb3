mod core;
mod tracker;

pub use self::core::{CycleOutcome, ScannerEngine};
pub use tracker::SpikeTracker;
