use super::http::fetch_json;
use crate::core::RateSource;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// PrivatBank quotes amounts as decimal strings; plain numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    fn value(&self) -> Result<f64> {
        match self {
            Amount::Number(n) => Ok(*n),
            Amount::Text(s) => s
                .trim()
                .parse()
                .with_context(|| format!("Invalid PrivatBank sale rate: '{s}'")),
        }
    }
}

// Only the matching record has to be complete; others may lack any field.
#[derive(Debug, Deserialize)]
struct PrivatBankRecord {
    #[serde(default)]
    ccy: Option<String>,
    #[serde(default)]
    base_ccy: Option<String>,
    #[serde(default)]
    sale: Option<Amount>,
}

impl PrivatBankRecord {
    fn is_usd_uah(&self) -> bool {
        self.ccy.as_deref() == Some("USD") && self.base_ccy.as_deref() == Some("UAH")
    }
}

/// Sale rate of the last USD/UAH record.
fn extract_sale(records: &[PrivatBankRecord]) -> Result<Option<f64>> {
    records
        .iter()
        .rev()
        .find(|r| r.is_usd_uah())
        .map(|r| {
            r.sale
                .as_ref()
                .ok_or_else(|| anyhow!("PrivatBank USD/UAH record has no sale rate"))?
                .value()
        })
        .transpose()
}

pub struct PrivatBankSource {
    url: String,
    client: Client,
}

impl PrivatBankSource {
    pub fn new(url: &str, client: Client) -> Self {
        PrivatBankSource {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateSource for PrivatBankSource {
    fn name(&self) -> &str {
        "privatbank"
    }

    #[instrument(name = "PrivatBankFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rate(&self) -> Result<Option<f64>> {
        let records: Vec<PrivatBankRecord> = fetch_json(&self.client, &self.url).await?;
        let rate = extract_sale(&records)?;
        debug!(records = records.len(), ?rate, "Parsed PrivatBank response");
        Ok(rate)
    }
}
