//! The rate check pipeline: fetch, compare, notify

use super::notify::{EmailMessage, Notifier, format_alert_message};
use super::rate::{RateAlert, RateSnapshot, RateSource, calculate_difference};
use anyhow::{Context, Result, ensure};
use futures::future::join_all;
use std::fmt::Display;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckSettings {
    pub threshold: f64,
    pub from: String,
    pub to: String,
    pub subject: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NotificationSent,
    NoSignificantChanges,
}

impl RunOutcome {
    pub fn status_line(&self) -> &'static str {
        match self {
            RunOutcome::NotificationSent => "Notification sent due to significant rate changes.",
            RunOutcome::NoSignificantChanges => {
                "No significant changes detected in currency rates."
            }
        }
    }
}

impl Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_line())
    }
}

/// Compares the first two sources and mails an alert when they diverge.
pub struct RateChecker {
    sources: Vec<Box<dyn RateSource>>,
    notifier: Box<dyn Notifier>,
    settings: CheckSettings,
}

impl RateChecker {
    pub fn new(
        sources: Vec<Box<dyn RateSource>>,
        notifier: Box<dyn Notifier>,
        settings: CheckSettings,
    ) -> Result<Self> {
        ensure!(
            sources.len() == 2,
            "Expected exactly two rate sources, got {}",
            sources.len()
        );
        Ok(RateChecker {
            sources,
            notifier,
            settings,
        })
    }

    /// Queries every source concurrently. A failing source is logged and left
    /// out of the snapshot; it never aborts the others.
    pub async fn fetch_rates(&self) -> RateSnapshot {
        let results = join_all(self.sources.iter().map(|s| s.fetch_rate())).await;

        let mut snapshot = RateSnapshot::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(Some(rate)) => {
                    debug!(source = source.name(), rate, "Fetched rate");
                    snapshot.insert(source.name(), rate);
                }
                Ok(None) => {
                    warn!(source = source.name(), "No USD/UAH record in response");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %format!("{e:#}"), "Failed to fetch rate");
                }
            }
        }
        snapshot
    }

    pub fn calculate_difference(&self, snapshot: &RateSnapshot) -> Option<RateAlert> {
        calculate_difference(
            snapshot,
            self.sources[0].name(),
            self.sources[1].name(),
            self.settings.threshold,
        )
    }

    pub async fn notify(&self, alerts: &[RateAlert]) -> Result<()> {
        ensure!(!alerts.is_empty(), "No alerts to send");

        let message = EmailMessage {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            subject: self.settings.subject.clone(),
            body: format_alert_message(alerts),
        };
        self.notifier.send(&message).await
    }

    #[instrument(name = "RateCheck", skip(self), fields(threshold = self.settings.threshold))]
    pub async fn run(&self) -> Result<RunOutcome> {
        let snapshot = self.fetch_rates().await;
        info!(
            fetched_at = %snapshot.fetched_at.to_rfc3339(),
            sources = snapshot.len(),
            "Collected rates"
        );

        match self.calculate_difference(&snapshot) {
            Some(alert) => {
                info!(%alert, "Rate difference reached threshold");
                self.notify(&[alert])
                    .await
                    .context("Failed to deliver rate alert")?;
                Ok(RunOutcome::NotificationSent)
            }
            None => Ok(RunOutcome::NoSignificantChanges),
        }
    }
}
