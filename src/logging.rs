//! Log subscriber setup.
//!
//! Installed once from `main` before anything logs. Output goes to stderr so
//! a one-shot run can print its invocation response on stdout untouched.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Dependency targets capped at `warn` regardless of the configured level.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn"];

/// Install the global subscriber described by `cfg`.
///
/// `RUST_LOG`, when set, replaces the configured filter entirely.
///
/// # Errors
/// Fails if the configured level is not a valid filter directive or a
/// subscriber is already installed.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives(cfg))
            .with_context(|| format!("invalid [logging] level `{}`", cfg.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("installing {} log subscriber: {e}", cfg.format))
}

fn directives(cfg: &LoggingConfig) -> String {
    std::iter::once(cfg.level.as_str())
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.into(),
            format: LogFormat::Text,
        }
    }

    #[test]
    fn directives_start_with_configured_level() {
        let d = directives(&logging("debug"));
        assert!(d.starts_with("debug,"), "got: {d}");
        assert!(d.contains("reqwest=warn"), "got: {d}");
    }

    #[test]
    fn directives_parse_as_env_filter() {
        assert!(EnvFilter::try_new(directives(&logging("info"))).is_ok());
        assert!(EnvFilter::try_new(directives(&logging("device_liveness=trace"))).is_ok());
    }

    #[test]
    fn garbage_level_is_rejected() {
        assert!(EnvFilter::try_new(directives(&logging("device_liveness=verbose"))).is_err());
    }
}
