use anyhow::{Context, Result, bail, ensure};
use directories::ProjectDirs;
use lettre::message::Mailbox;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const PRIVATBANK_URL: &str = "https://api.privatbank.ua/p24api/pubinfo?json&exchange&coursid=5";
pub const MONOBANK_URL: &str = "https://api.monobank.ua/bank/currency";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub privatbank: SourceConfig,
    pub monobank: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            privatbank: SourceConfig {
                url: PRIVATBANK_URL.to_string(),
            },
            monobank: SourceConfig {
                url: MONOBANK_URL.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig { timeout_secs: 10 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub username: Option<String>,
    /// Only ever populated from `RATEWATCH_SMTP_PASSWORD`.
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            tls: false,
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub smtp: SmtpConfig,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            from: "alert@example.com".to_string(),
            to: "user@example.com".to_string(),
            subject: "Currency Rate Alert".to_string(),
            smtp: SmtpConfig::default(),
        }
    }
}

fn default_threshold() -> f64 {
    1.5
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            threshold: default_threshold(),
            http: HttpConfig::default(),
            sources: SourcesConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// it does not exist. Environment overrides are applied and the result validated.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let mut config = if config_path.exists() {
            Self::read_from_path(&config_path)?
        } else {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            Self::default()
        };
        config.finish(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ua", "ratewatch", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::load_from_path_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load_from_path`], with overrides taken from `lookup`
    /// instead of the process environment.
    pub fn load_from_path_with<P: AsRef<std::path::Path>>(
        path: P,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::read_from_path(path)?;
        config.finish(lookup)?;
        Ok(config)
    }

    fn read_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn finish(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.apply_overrides(lookup)?;
        self.validate()
    }

    /// Applies `RATEWATCH_*` overrides using the given variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("RATEWATCH_THRESHOLD") {
            self.threshold = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid RATEWATCH_THRESHOLD: '{raw}'"))?;
        }
        if let Some(from) = lookup("RATEWATCH_MAIL_FROM") {
            self.mail.from = from;
        }
        if let Some(to) = lookup("RATEWATCH_MAIL_TO") {
            self.mail.to = to;
        }
        if let Some(host) = lookup("RATEWATCH_SMTP_HOST") {
            self.mail.smtp.host = host;
        }
        if let Some(password) = lookup("RATEWATCH_SMTP_PASSWORD") {
            self.mail.smtp.password = Some(password);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.threshold.is_finite() && self.threshold >= 0.0,
            "Threshold must be a non-negative number, got {}",
            self.threshold
        );
        ensure!(
            self.http.timeout_secs > 0,
            "HTTP timeout must be greater than zero"
        );

        for (name, source) in [
            ("privatbank", &self.sources.privatbank),
            ("monobank", &self.sources.monobank),
        ] {
            let url = Url::parse(&source.url)
                .with_context(|| format!("Invalid URL for source {name}: '{}'", source.url))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("Unsupported URL scheme for source {name}: '{}'", source.url);
            }
        }

        self.mail
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid sender address: '{}'", self.mail.from))?;
        self.mail
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address: '{}'", self.mail.to))?;
        ensure!(!self.mail.smtp.host.is_empty(), "SMTP host must not be empty");

        Ok(())
    }
}
