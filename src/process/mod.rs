// src/process/mod.rs
pub mod contract_month;
pub mod utils;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::schema::{BatchStamp, SettlementRecord};
use utils::cell_text;

/// Cells in a settlement row: commodity, contract month, previous price,
/// current price, variation, settlement value.
pub const SETTLEMENT_CELLS: usize = 6;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("settlement selectors should parse")
}

/// Parse the settlement page and collect the batch.
#[tracing::instrument(level = "info", skip(html), fields(bytes = html.len()))]
pub fn extract_from_str(html: &str, stamp: BatchStamp) -> Result<Vec<SettlementRecord>> {
    let doc = Html::parse_document(html);
    let records: Vec<SettlementRecord> = extract_records(&doc, stamp)?.collect();
    debug!(rows = records.len(), "extracted settlement rows");
    Ok(records)
}

/// Lazily turn the page's first `<table>` into settlement records.
///
/// - The first `<tr>` is the header and is skipped.
/// - Rows without exactly six `<td>` cells are skipped.
/// - The page prints a commodity only on the first row of its group, so the
///   last non-empty commodity cell is carried forward through the fold.
/// - Every record is stamped with `stamp`; the clock is never read here.
///
/// Fails only when the document has no table at all. A table with no
/// qualifying rows yields an empty iterator.
pub fn extract_records<'a>(
    doc: &'a Html,
    stamp: BatchStamp,
) -> Result<impl Iterator<Item = SettlementRecord> + 'a> {
    let table = doc
        .select(&selector("table"))
        .next()
        .ok_or_else(|| Error::Parse("no <table> element in settlement page".into()))?;

    let rows: Vec<ElementRef<'a>> = table.select(&selector("tr")).skip(1).collect();
    trace!(rows = rows.len(), "table rows after header");

    let td = selector("td");
    Ok(rows
        .into_iter()
        .filter_map(move |row| settlement_cells(row, &td))
        .scan(None, move |current_commodity: &mut Option<String>, cells| {
            Some(carry_forward(current_commodity, cells, &stamp))
        })
        .flatten())
}

/// Trimmed cell texts of a row, or `None` unless it has exactly six cells.
fn settlement_cells(row: ElementRef<'_>, td: &Selector) -> Option<[String; SETTLEMENT_CELLS]> {
    let cells: Vec<String> = row.select(td).map(cell_text).collect();
    match <[String; SETTLEMENT_CELLS]>::try_from(cells) {
        Ok(cells) => Some(cells),
        Err(cells) => {
            trace!(cells = cells.len(), "skipping non-settlement row");
            None
        }
    }
}

/// One step of the commodity fold: a non-empty commodity cell replaces the
/// accumulator, and the record always takes the accumulator's value.
fn carry_forward(
    current_commodity: &mut Option<String>,
    cells: [String; SETTLEMENT_CELLS],
    stamp: &BatchStamp,
) -> Option<SettlementRecord> {
    if !cells[0].is_empty() {
        *current_commodity = Some(cells[0].clone());
    }
    match current_commodity {
        Some(commodity) => Some(SettlementRecord::from_cells(commodity.clone(), cells, stamp)),
        None => {
            warn!(contract = %cells[1], "row before any commodity header; skipping");
            None
        }
    }
}
