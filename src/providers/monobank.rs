use super::http::fetch_json;
use crate::core::RateSource;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

const ISO_USD: u16 = 840;
const ISO_UAH: u16 = 980;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonobankRecord {
    currency_code_a: u16,
    currency_code_b: u16,
    // Absent on cross-rate records, which only carry `rateCross`.
    rate_sell: Option<f64>,
}

/// Sell rate of the last USD/UAH record that carries one.
fn extract_rate_sell(records: &[MonobankRecord]) -> Option<f64> {
    records
        .iter()
        .rev()
        .filter(|r| r.currency_code_a == ISO_USD && r.currency_code_b == ISO_UAH)
        .find_map(|r| r.rate_sell)
}

pub struct MonobankSource {
    url: String,
    client: Client,
}

impl MonobankSource {
    pub fn new(url: &str, client: Client) -> Self {
        MonobankSource {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateSource for MonobankSource {
    fn name(&self) -> &str {
        "monobank"
    }

    #[instrument(name = "MonobankFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rate(&self) -> Result<Option<f64>> {
        let records: Vec<MonobankRecord> = fetch_json(&self.client, &self.url).await?;
        let rate = extract_rate_sell(&records);
        debug!(records = records.len(), ?rate, "Parsed Monobank response");
        Ok(rate)
    }
}
