pub mod types;

pub use types::{BatchStamp, SettlementRecord, COLUMNS, TABLE};
