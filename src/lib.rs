pub mod error;
pub mod fetch;
pub mod history;
pub mod pipeline;
pub mod process;
pub mod schema;

pub use error::{Error, Result};
pub use schema::{BatchStamp, SettlementRecord};
