// src/schema/types.rs

use chrono::{Local, NaiveDate, NaiveTime, Timelike};

/// Table the settlement history lives in.
pub const TABLE: &str = "all_futures";

/// Column names of `all_futures`, in insert order.
pub const COLUMNS: [&str; 8] = [
    "Commodity",
    "Contract_Month",
    "Previous_Price",
    "Current_Price",
    "Variation",
    "Settlement_Value",
    "download_date",
    "download_time",
];

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Wall-clock moment of one scrape, shared by every record in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchStamp {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl BatchStamp {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        // stored with second precision, so drop the fraction up front
        let time = time.with_nanosecond(0).unwrap_or(time);
        Self { date, time }
    }

    /// Local wall-clock time. Only the run binary should call this.
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        Self::new(now.date(), now.time())
    }

    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// One settlement quote for one contract at one scrape time.
///
/// Prices are kept as the exchange prints them (e.g. `"1,234.56"`); see
/// [`crate::history::series::parse_decimal`] for numeric access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    pub commodity: String,
    pub contract_month: String,
    pub previous_price: String,
    pub current_price: String,
    pub variation: String,
    pub settlement_value: String,
    pub download_date: String,
    pub download_time: String,
}

impl SettlementRecord {
    /// Build a record from the six trimmed table cells and the batch stamp.
    pub fn from_cells(commodity: String, cells: [String; 6], stamp: &BatchStamp) -> Self {
        let [_, contract_month, previous_price, current_price, variation, settlement_value] =
            cells;
        Self {
            commodity,
            contract_month,
            previous_price,
            current_price,
            variation,
            settlement_value,
            download_date: stamp.date_str(),
            download_time: stamp.time_str(),
        }
    }

    /// The (date, time) pair identifying the batch this record came from.
    pub fn batch_key(&self) -> (&str, &str) {
        (&self.download_date, &self.download_time)
    }

    /// Download date parsed back into a calendar date.
    pub fn downloaded_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.download_date, DATE_FORMAT).ok()
    }
}
