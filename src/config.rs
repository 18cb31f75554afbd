//! Configuration types for device-liveness.
//!
//! Config is loaded once at startup from a TOML file and validated before any
//! probe is sent. Every field has a default, so a deployment with no config
//! file at all probes `http://<host>:8001/ping` with a 5 second ceiling.
//!
//! # Example
//! ```toml
//! [probe]
//! port       = 8001
//! path       = "/ping"
//! timeout_ms = 5000
//!
//! [settings]
//! path          = "/etc/device-liveness/settings.toml"
//! device_id_env = "DATABASE_ID"
//!
//! [logging]
//! level  = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file location and load it.
    ///
    /// `DL_CONFIG` wins when set and must point at a readable file. Otherwise
    /// the default location is used if present, and built-in defaults if not.
    pub fn discover() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("DL_CONFIG") {
            let path = PathBuf::from(path);
            return Self::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()));
        }

        let fallback = Path::new(defaults::CONFIG_PATH);
        if fallback.exists() {
            Self::load(fallback)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.probe.port != 0, "[probe] port must be non-zero");
        anyhow::ensure!(
            self.probe.timeout_ms > 0,
            "[probe] timeout_ms must be greater than zero"
        );
        anyhow::ensure!(
            self.probe.path.starts_with('/'),
            "[probe] path `{}` must start with `/`",
            self.probe.path
        );
        anyhow::ensure!(
            !self.settings.device_id_env.trim().is_empty(),
            "[settings] device_id_env must name an environment variable"
        );
        anyhow::ensure!(self.server.port != 0, "[server] port must be non-zero");
        Ok(())
    }
}

/// Outbound probe parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Port the device's ping endpoint listens on (default: 8001).
    #[serde(default = "defaults::probe_port")]
    pub port: u16,

    /// Request path on the device (default: `/ping`).
    #[serde(default = "defaults::probe_path")]
    pub path: String,

    /// Ceiling for the whole request, connect through body, in milliseconds
    /// (default: 5 000).
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: defaults::probe_port(),
            path: defaults::probe_path(),
            timeout_ms: defaults::timeout_ms(),
        }
    }
}

/// Where device records come from and how the device to check is selected.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsConfig {
    /// TOML file holding the `[devices.<id>]` records.
    #[serde(default = "defaults::settings_path")]
    pub path: PathBuf,

    /// Environment variable whose value is the identifier of the device to
    /// check on a one-shot or `/invoke` run.
    #[serde(default = "defaults::device_id_env")]
    pub device_id_env: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: defaults::settings_path(),
            device_id_env: defaults::device_id_env(),
        }
    }
}

impl SettingsConfig {
    /// Read the device identifier from the configured environment variable.
    ///
    /// An unset or blank variable yields `None`.
    pub fn device_id(&self) -> Option<String> {
        std::env::var(&self.device_id_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info` or `debug`.
    #[serde(default = "defaults::log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// `serve` mode listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::server_port(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub const CONFIG_PATH: &str = "/etc/device-liveness/config.toml";

    pub fn probe_port() -> u16 { 8001 }
    pub fn probe_path() -> String { "/ping".into() }
    pub fn timeout_ms() -> u64 { 5_000 }
    pub fn settings_path() -> PathBuf { PathBuf::from("/etc/device-liveness/settings.toml") }
    pub fn device_id_env() -> String { "DATABASE_ID".into() }
    pub fn log_level() -> String { "info".into() }
    pub fn server_port() -> u16 { 8080 }
}
