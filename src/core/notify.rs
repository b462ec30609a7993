//! Alert notification abstractions

use super::rate::RateAlert;
use anyhow::Result;
use async_trait::async_trait;

pub const ALERT_HEADER: &str = "Currency rate alert:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers a plain-text email. Failures must be returned, never swallowed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Renders the alert body: a header line followed by one line per alert.
pub fn format_alert_message(alerts: &[RateAlert]) -> String {
    let mut text = format!("{ALERT_HEADER}\n");
    for alert in alerts {
        text.push_str(&alert.to_string());
        text.push('\n');
    }
    text
}
