// src/history/store.rs

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::{path::Path, time::Duration};
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::schema::{types::DATE_FORMAT, SettlementRecord, TABLE};

/// How a batch meets the rows already in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Keep history and add the batch.
    #[default]
    Append,
    /// Drop and recreate the table, keeping only this batch. Intended as a
    /// schema reset for deployments that preserve history outside the file.
    Replace,
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS all_futures (
    Commodity        TEXT NOT NULL CHECK (Commodity <> ''),
    Contract_Month   TEXT,
    Previous_Price   TEXT,
    Current_Price    TEXT,
    Variation        TEXT,
    Settlement_Value TEXT,
    download_date    TEXT NOT NULL,
    download_time    TEXT NOT NULL
)";

const INSERT_ROW: &str = "INSERT INTO all_futures (
    Commodity, Contract_Month, Previous_Price, Current_Price,
    Variation, Settlement_Value, download_date, download_time
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SELECT_COLUMNS: &str = "SELECT Commodity, Contract_Month, Previous_Price, Current_Price,
    Variation, Settlement_Value, download_date, download_time FROM all_futures";

/// Settlement history in a single SQLite table.
pub struct SettlementStore {
    conn: Connection,
}

impl SettlementStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(db = %path.as_ref().display(), "opened settlement store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // a second scraper waits for the first one's batch instead of failing
        conn.busy_timeout(Duration::from_secs(30))?;
        Ok(Self { conn })
    }

    /// Persist `batch` in one transaction and return the number of rows written.
    ///
    /// Any failure rolls the whole transaction back, so the table is left
    /// exactly as it was before the call (including not existing at all).
    #[instrument(level = "info", skip(self, batch), fields(rows = batch.len()))]
    pub fn write_batch(&mut self, batch: &[SettlementRecord], policy: WritePolicy) -> Result<usize> {
        if batch.is_empty() {
            warn!(?policy, "empty batch");
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if policy == WritePolicy::Replace {
            tx.execute_batch("DROP TABLE IF EXISTS all_futures")?;
        }
        tx.execute_batch(CREATE_TABLE)?;

        {
            let mut stmt = tx.prepare(INSERT_ROW)?;
            for rec in batch {
                stmt.execute(params![
                    rec.commodity,
                    rec.contract_month,
                    rec.previous_price,
                    rec.current_price,
                    rec.variation,
                    rec.settlement_value,
                    rec.download_date,
                    rec.download_time,
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = batch.len(), ?policy, table = TABLE, "batch committed");
        Ok(batch.len())
    }

    fn table_exists(&self) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![TABLE],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Total stored rows; zero when the table does not exist yet.
    pub fn count(&self) -> Result<usize> {
        if !self.table_exists()? {
            return Ok(0);
        }
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM all_futures", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Every stored row, newest batch first.
    pub fn all_records(&self) -> Result<Vec<SettlementRecord>> {
        self.query(
            &format!("{SELECT_COLUMNS} ORDER BY download_date DESC, download_time DESC"),
            params![],
        )
    }

    /// Rows of the most recent batch.
    pub fn latest_batch(&self) -> Result<Vec<SettlementRecord>> {
        self.query(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE (download_date, download_time) = (
                     SELECT download_date, download_time FROM all_futures
                     ORDER BY download_date DESC, download_time DESC LIMIT 1)
                 ORDER BY Commodity, Contract_Month"
            ),
            params![],
        )
    }

    /// Rows whose commodity contains `pattern` as a literal substring (ASCII
    /// case-insensitive), optionally from `since` on, oldest first.
    pub fn commodity_history(
        &self,
        pattern: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SettlementRecord>> {
        let since = since.map(|d| d.format(DATE_FORMAT).to_string());
        self.query(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE Commodity LIKE '%' || ?1 || '%' ESCAPE '\\'
                   AND (?2 IS NULL OR download_date >= ?2)
                 ORDER BY download_date, download_time"
            ),
            params![escape_like(pattern), since],
        )
    }

    /// Distinct commodity labels in first-seen order.
    pub fn commodities(&self) -> Result<Vec<String>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare("SELECT Commodity FROM all_futures GROUP BY Commodity ORDER BY MIN(rowid)")?;
        let labels = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .filter_map(|r| r.transpose())
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(labels)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SettlementRecord>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Escape `LIKE` wildcards so the pattern matches literally under `ESCAPE '\'`.
fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Tables written by older tooling may hold NULLs; read them as empty text.
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SettlementRecord> {
    let text = |i: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
    };
    Ok(SettlementRecord {
        commodity: text(0)?,
        contract_month: text(1)?,
        previous_price: text(2)?,
        current_price: text(3)?,
        variation: text(4)?,
        settlement_value: text(5)?,
        download_date: text(6)?,
        download_time: text(7)?,
    })
}
