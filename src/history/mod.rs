// src/history/mod.rs

pub mod series;
pub mod store;

pub use series::{group_series, parse_decimal, rolling_volatility, yield_curve, ContractSeries};
pub use store::{SettlementStore, WritePolicy};
