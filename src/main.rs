// src/main.rs

use anyhow::{Context, Result};
use b3settle::{
    fetch::SETTLEMENT_URL,
    history::WritePolicy,
    pipeline::{self, RunConfig},
    BatchStamp,
};
use clap::Parser;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

/// Scrape today's B3 settlement prices into the SQLite history.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settlement page to scrape
    #[arg(long, env = "B3_SETTLEMENT_URL", default_value = SETTLEMENT_URL)]
    url: Url,

    /// SQLite database holding the `all_futures` table
    #[arg(long, env = "B3_DB_PATH", default_value = "b3_futures.db")]
    db: PathBuf,

    /// Drop and recreate the table instead of appending (schema reset)
    #[arg(long)]
    replace: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) one timestamp for the whole batch ────────────────────────
    let stamp = BatchStamp::now();
    info!(
        url = %args.url,
        db = %args.db.display(),
        date = %stamp.date_str(),
        time = %stamp.time_str(),
        replace = args.replace,
        "startup"
    );

    // ─── 3) scrape and persist ───────────────────────────────────────
    let config = RunConfig {
        url: args.url.clone(),
        db: args.db.clone(),
        policy: if args.replace {
            WritePolicy::Replace
        } else {
            WritePolicy::Append
        },
    };
    match pipeline::scrape_once(&Client::new(), &config, stamp).await {
        Ok(rows) => {
            info!(rows, "all done");
            Ok(())
        }
        Err(e) => {
            let stage = e.stage();
            error!(stage, error = %e, "scrape run failed");
            Err(e).with_context(|| format!("{stage} stage failed"))
        }
    }
}
