//! Settings and secrets for one run.
//!
//! Secrets come from the environment (a `.env` file is honoured); everything
//! else has a default and may be overridden by an optional RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use slotwatch_engine::{DiscoverySettings, MailSettings, ProbeSettings, WatchSettings};

pub const SENDER_ENV: &str = "MAIL_SENDER";
pub const PASSWORD_ENV: &str = "MAIL_PASSWORD";
pub const RECEIVER_ENV: &str = "MAIL_RECEIVER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set; provide it in the environment or a .env file")]
    MissingSecret(&'static str),
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Mail identity and credential. Never logged.
pub struct Secrets {
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (local runs)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as missing. The password is checked first so that
    /// the most common misconfiguration is the one reported.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingSecret(key))
        };
        let password = require(PASSWORD_ENV)?;
        Ok(Self {
            sender: require(SENDER_ENV)?,
            password,
            recipient: require(RECEIVER_ENV)?,
        })
    }
}

/// Non-secret settings as written in the config file. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source_url: String,
    pub container_selector: String,
    pub source_navigation_timeout_ms: u64,
    pub render_wait_ms: u64,
    pub settle_ms: u64,
    pub marker_text: String,
    pub capacity_label: String,
    pub probe_navigation_timeout_ms: u64,
    pub marker_wait_ms: u64,
    pub probe_delay_ms: u64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_timeout_ms: u64,
    pub sender_name: String,
    pub recipient_name: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        let discovery = DiscoverySettings::default();
        let probe = ProbeSettings::default();
        Self {
            source_url: discovery.source_url,
            container_selector: discovery.container_selector,
            source_navigation_timeout_ms: millis(discovery.navigation_timeout),
            render_wait_ms: millis(discovery.render_wait),
            settle_ms: millis(discovery.settle),
            marker_text: probe.marker_text,
            capacity_label: probe.capacity_label,
            probe_navigation_timeout_ms: millis(probe.navigation_timeout),
            marker_wait_ms: millis(probe.marker_wait),
            probe_delay_ms: millis(probe.delay),
            smtp_host: MailSettings::DEFAULT_HOST.to_string(),
            smtp_port: MailSettings::DEFAULT_PORT,
            smtp_timeout_ms: 30_000,
            sender_name: MailSettings::DEFAULT_SENDER_NAME.to_string(),
            recipient_name: MailSettings::DEFAULT_RECIPIENT_NAME.to_string(),
        }
    }
}

impl FileConfig {
    /// Defaults when `path` is `None`; otherwise the file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn watch_settings(&self) -> WatchSettings {
        WatchSettings {
            discovery: DiscoverySettings {
                source_url: self.source_url.clone(),
                container_selector: self.container_selector.clone(),
                navigation_timeout: Duration::from_millis(self.source_navigation_timeout_ms),
                render_wait: Duration::from_millis(self.render_wait_ms),
                settle: Duration::from_millis(self.settle_ms),
            },
            probe: ProbeSettings {
                navigation_timeout: Duration::from_millis(self.probe_navigation_timeout_ms),
                marker_text: self.marker_text.clone(),
                marker_wait: Duration::from_millis(self.marker_wait_ms),
                capacity_label: self.capacity_label.clone(),
                delay: Duration::from_millis(self.probe_delay_ms),
            },
        }
    }

    pub fn mail_settings(&self, secrets: Secrets) -> MailSettings {
        MailSettings {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            sender: secrets.sender,
            sender_name: self.sender_name.clone(),
            password: secrets.password,
            recipient: secrets.recipient,
            recipient_name: self.recipient_name.clone(),
            timeout: Duration::from_millis(self.smtp_timeout_ms),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
