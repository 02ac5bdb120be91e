pub mod settlement;
pub mod store;

pub use settlement::SettlementEngine;
pub use store::{AccountRecord, LedgerStore, PlatformStats};
