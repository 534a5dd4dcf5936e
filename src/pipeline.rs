// src/pipeline.rs

use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::Result;
use crate::fetch;
use crate::history::{SettlementStore, WritePolicy};
use crate::process;
use crate::schema::BatchStamp;

/// Where one scrape run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: Url,
    pub db: PathBuf,
    pub policy: WritePolicy,
}

/// fetch → extract → store for one batch; the error carries the stage that
/// broke. Returns the number of rows committed.
#[instrument(level = "info", skip(client, config), fields(db = %config.db.display()))]
pub async fn scrape_once(client: &Client, config: &RunConfig, stamp: BatchStamp) -> Result<usize> {
    let html = fetch::fetch_settlement_page(client, &config.url).await?;

    let batch = process::extract_from_str(&html, stamp)?;
    if batch.is_empty() {
        warn!("settlement table has no rows; nothing published today");
    }

    let mut store = SettlementStore::open(&config.db)?;
    let written = store.write_batch(&batch, config.policy)?;

    // the batch is already committed, so a failed count must not fail the run
    match store.count() {
        Ok(total) => info!(total, "rows in history"),
        Err(e) => warn!(error = %e, "could not count rows after commit"),
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body><table>
        <tr><th>Commodity</th><th>Contract Month</th><th>Previous</th><th>Current</th><th>Variation</th><th>Value</th></tr>
        <tr><td>DI1</td><td>F26</td><td>85,100.00</td><td>85,120.00</td><td>20.00</td><td>20.00</td></tr>
        <tr><td></td><td>F27</td><td>76,000.00</td><td>75,990.00</td><td>-10.00</td><td>-10.00</td></tr>
        </table></body></html>"#;

    fn stamp() -> BatchStamp {
        BatchStamp::new(
            NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        )
    }

    async fn serve(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn config(server: &MockServer, db: PathBuf) -> RunConfig {
        RunConfig {
            url: Url::parse(&server.uri()).unwrap(),
            db,
            policy: WritePolicy::Append,
        }
    }

    #[tokio::test]
    async fn run_appends_scraped_batch() {
        let server = serve(ResponseTemplate::new(200).set_body_string(PAGE)).await;
        let tmp = tempdir().unwrap();
        let cfg = config(&server, tmp.path().join("b3_futures.db"));
        let client = Client::new();

        assert_eq!(scrape_once(&client, &cfg, stamp()).await.unwrap(), 2);
        assert_eq!(scrape_once(&client, &cfg, stamp()).await.unwrap(), 2);

        let store = SettlementStore::open(&cfg.db).unwrap();
        assert_eq!(store.count().unwrap(), 4);
        assert!(store.all_records().unwrap().iter().all(|r| r.commodity == "DI1"));
    }

    #[tokio::test]
    async fn unavailable_page_fails_in_fetch_stage() {
        let server = serve(ResponseTemplate::new(503)).await;
        let tmp = tempdir().unwrap();
        let cfg = config(&server, tmp.path().join("b3_futures.db"));

        let err = scrape_once(&Client::new(), &cfg, stamp()).await.unwrap_err();
        assert_eq!(err.stage(), "fetch");
        // nothing reached the store
        assert!(!cfg.db.exists());
    }

    #[tokio::test]
    async fn page_without_table_fails_in_parse_stage() {
        let body = "<html><body><p>Sem ajustes</p></body></html>";
        let server = serve(ResponseTemplate::new(200).set_body_string(body)).await;
        let tmp = tempdir().unwrap();
        let cfg = config(&server, tmp.path().join("b3_futures.db"));

        let err = scrape_once(&Client::new(), &cfg, stamp()).await.unwrap_err();
        assert_eq!(err.stage(), "parse");
        assert!(!cfg.db.exists());
    }

    #[tokio::test]
    async fn unwritable_db_fails_in_store_stage() {
        let server = serve(ResponseTemplate::new(200).set_body_string(PAGE)).await;
        let tmp = tempdir().unwrap();
        // SQLite does not create missing parent directories
        let cfg = config(&server, tmp.path().join("no_such_dir").join("b3_futures.db"));

        let err = scrape_once(&Client::new(), &cfg, stamp()).await.unwrap_err();
        assert_eq!(err.stage(), "store");
    }
}
