// src/fetch/mod.rs

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::Result;

/// English edition of the B3 "Ajustes do Pregão" settlement page.
pub const SETTLEMENT_URL: &str =
    "https://www2.bmf.com.br/pages/portal/bmfbovespa/lumis/lum-ajustes-do-pregao-enUS.asp";

/// GET the settlement page and return its body decoded as UTF-8.
///
/// The page does not reliably declare its charset, so the declared encoding
/// is ignored and invalid sequences are replaced. Not retried: a failed fetch
/// fails the run.
#[instrument(level = "info", skip(client, url), fields(url = %url))]
pub async fn fetch_settlement_page(client: &Client, url: &Url) -> Result<String> {
    debug!("requesting settlement page");
    let resp = client.get(url.clone()).send().await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    info!(bytes = bytes.len(), "fetched settlement page");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
