pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{CheckSettings, Notifier, RateChecker, RateSource, RunOutcome};
use anyhow::Result;
use tracing::{debug, info};

/// Wires configured sources and the mail transport into a checker.
pub fn build_checker(config: &AppConfig, dry_run: bool) -> Result<RateChecker> {
    let client = providers::http::build_client(config.http.timeout())?;

    let sources: Vec<Box<dyn RateSource>> = vec![
        Box::new(providers::PrivatBankSource::new(
            &config.sources.privatbank.url,
            client.clone(),
        )),
        Box::new(providers::MonobankSource::new(
            &config.sources.monobank.url,
            client,
        )),
    ];

    let notifier: Box<dyn Notifier> = if dry_run {
        Box::new(providers::DryRunNotifier)
    } else {
        Box::new(providers::SmtpNotifier::new(
            &config.mail.smtp,
            config.http.timeout(),
        )?)
    };

    let settings = CheckSettings {
        threshold: config.threshold,
        from: config.mail.from.clone(),
        to: config.mail.to.clone(),
        subject: config.mail.subject.clone(),
    };

    RateChecker::new(sources, notifier, settings)
}

/// Loads configuration and performs a single rate check.
pub async fn run_check(config_path: Option<&str>, dry_run: bool) -> Result<RunOutcome> {
    info!("Rate check starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    run_with_config(&config, dry_run).await
}

/// Performs a single rate check with an already loaded configuration.
pub async fn run_with_config(config: &AppConfig, dry_run: bool) -> Result<RunOutcome> {
    debug!(
        threshold = config.threshold,
        privatbank = %config.sources.privatbank.url,
        monobank = %config.sources.monobank.url,
        "Loaded config"
    );

    let checker = build_checker(config, dry_run)?;
    checker.run().await
}
