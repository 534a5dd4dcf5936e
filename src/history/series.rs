use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;

use crate::process::contract_month;
use crate::schema::{
    types::{DATE_FORMAT, TIME_FORMAT},
    SettlementRecord,
};

/// Trading days per year used to annualize volatility.
pub const TRADING_DAYS: f64 = 252.0;

/// Parse an exchange-formatted number such as `"99,982.57"` or `"-0.45"`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub price: f64,
}

/// Current-price history of one contract, oldest point first.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractSeries {
    pub commodity: String,
    pub contract_month: String,
    pub points: Vec<PricePoint>,
}

impl ContractSeries {
    pub fn label(&self) -> String {
        format!("{} {}", self.commodity, self.contract_month)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}

/// Group records into one series per (commodity, contract month), in the order
/// contracts are first seen. Rows with an unreadable timestamp or current price
/// are left out.
pub fn group_series(records: &[SettlementRecord]) -> Vec<ContractSeries> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut out: Vec<ContractSeries> = Vec::new();

    for rec in records {
        let Some(point) = price_point(rec) else {
            continue;
        };
        let key = (rec.commodity.as_str(), rec.contract_month.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            out.push(ContractSeries {
                commodity: rec.commodity.clone(),
                contract_month: rec.contract_month.clone(),
                points: Vec::new(),
            });
            out.len() - 1
        });
        out[slot].points.push(point);
    }

    for series in &mut out {
        series.points.sort_by_key(|p| (p.date, p.time));
    }
    out
}

fn price_point(rec: &SettlementRecord) -> Option<PricePoint> {
    Some(PricePoint {
        date: NaiveDate::parse_from_str(&rec.download_date, DATE_FORMAT).ok()?,
        time: NaiveTime::parse_from_str(&rec.download_time, TIME_FORMAT).ok()?,
        price: parse_decimal(&rec.current_price)?,
    })
}

/// Simple returns between consecutive prices; one shorter than the input.
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Annualized rolling volatility, aligned with `prices`.
///
/// Entry `i` is the sample standard deviation of the `window` returns ending
/// at price `i`, times √252. Entries without a full window of finite returns
/// are `None`.
pub fn rolling_volatility(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let returns = pct_returns(prices);
    let mut out = vec![None; prices.len()];
    if window < 2 {
        return out;
    }

    for end in window..=returns.len() {
        let slice = &returns[end - window..end];
        if slice.iter().any(|r| !r.is_finite()) {
            continue;
        }
        let n = window as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        // returns[k] ends at prices[k + 1]
        out[end] = Some(var.sqrt() * TRADING_DAYS.sqrt());
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub contract_month: String,
    pub days_to_maturity: i64,
    pub price: f64,
}

/// Term structure of one day: price against days to maturity as of `as_of`,
/// shortest maturity first. When a contract was scraped more than once, its
/// last quote wins. Expired contracts stay in with negative days; contracts
/// whose code or price does not parse are skipped.
pub fn yield_curve(records: &[SettlementRecord], as_of: NaiveDate) -> Vec<CurvePoint> {
    let mut last_quote: HashMap<(&str, &str), &SettlementRecord> = HashMap::new();
    for rec in records {
        last_quote
            .entry((rec.commodity.as_str(), rec.contract_month.as_str()))
            .and_modify(|seen| {
                if rec.batch_key() >= seen.batch_key() {
                    *seen = rec;
                }
            })
            .or_insert(rec);
    }

    let mut curve: Vec<CurvePoint> = last_quote
        .into_values()
        .filter_map(|rec| {
            Some(CurvePoint {
                contract_month: rec.contract_month.clone(),
                days_to_maturity: contract_month::decode(&rec.contract_month)
                    .days_to_maturity(as_of)?,
                price: parse_decimal(&rec.current_price)?,
            })
        })
        .collect();
    curve.sort_by(|a, b| {
        a.days_to_maturity
            .cmp(&b.days_to_maturity)
            .then_with(|| a.contract_month.cmp(&b.contract_month))
    });
    curve
}
