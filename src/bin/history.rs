use anyhow::{Context, Result};
use b3settle::history::{group_series, rolling_volatility, yield_curve, SettlementStore};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Print one commodity's settlement history with rolling volatility and the
/// latest term structure.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// SQLite database holding the `all_futures` table
    #[arg(long, env = "B3_DB_PATH", default_value = "b3_futures.db")]
    db: PathBuf,

    /// Substring matched against the commodity label
    #[arg(long, default_value = "DI1")]
    commodity: String,

    /// Days of history to include, counted back from today
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(0..=36_500))]
    days: i64,

    /// Number of returns per volatility window
    #[arg(long, default_value_t = 30)]
    window: usize,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// First day of the reporting window, or `None` when it cannot be represented.
fn history_cutoff(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|window| today.checked_sub_signed(window))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = SettlementStore::open(&args.db)
        .with_context(|| format!("opening {}", args.db.display()))?;

    let today = Local::now().date_naive();
    let since = history_cutoff(today, args.days);
    if since.is_none() {
        warn!(days = args.days, "window reaches past the calendar; reading all history");
    }
    let records = store
        .commodity_history(&args.commodity, since)
        .with_context(|| format!("querying history for {}", args.commodity))?;
    info!(rows = records.len(), commodity = %args.commodity, ?since, "loaded history");

    if records.is_empty() {
        warn!(commodity = %args.commodity, "no rows in range");
        return Ok(());
    }

    println!(
        "{:<40} {:>6} {:>14} {:>10}",
        "contract", "points", "last price", "vol (ann.)"
    );
    for series in group_series(&records) {
        let prices = series.prices();
        let vol = rolling_volatility(&prices, args.window)
            .last()
            .copied()
            .flatten();
        println!(
            "{:<40} {:>6} {:>14.2} {:>10}",
            series.label(),
            prices.len(),
            prices.last().copied().unwrap_or(f64::NAN),
            vol.map(|v| format!("{:.2}%", v * 100.0))
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    let latest = store.latest_batch().context("querying latest batch")?;
    // same case-insensitive match as the LIKE query above
    let needle = args.commodity.to_lowercase();
    let latest: Vec<_> = latest
        .into_iter()
        .filter(|r| r.commodity.to_lowercase().contains(&needle))
        .collect();
    let Some(as_of) = latest.first().and_then(|r| r.downloaded_on()) else {
        return Ok(());
    };

    println!("\nterm structure as of {as_of}");
    for point in yield_curve(&latest, as_of) {
        println!(
            "{:<8} {:>6}d {:>14.2}",
            point.contract_month, point.days_to_maturity, point.price
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_counts_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(history_cutoff(today, 30), NaiveDate::from_ymd_opt(2025, 2, 8));
        assert_eq!(history_cutoff(today, 0), Some(today));
    }

    #[test]
    fn oversized_window_means_no_cutoff() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(history_cutoff(today, i64::MAX), None);
        assert_eq!(history_cutoff(today, 1_000_000_000), None);
    }

    #[test]
    fn days_flag_is_bounded() {
        assert!(Args::try_parse_from(["history", "--days", "36500"]).is_ok());
        assert!(Args::try_parse_from(["history", "--days", "36501"]).is_err());
        assert!(Args::try_parse_from(["history", "--days", "-1"]).is_err());
    }
}
