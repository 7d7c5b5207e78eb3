// Signal derivation: pure transforms over market snapshots
pub mod fibonacci;
pub mod orderbook;
pub mod spike;
