//! Subscriber setup for binaries and test harnesses embedding this crate.
//!
//! Library code only emits events; nothing here runs unless the host calls
//! [`init_logging`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::ValidationError;

/// Dependency modules held at `warn` unless `RUST_LOG` says otherwise.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ValidationError::InvalidConfig {
                key: "LIMITBOARD_LOG_FORMAT",
                value: value.to_owned(),
            }),
        }
    }
}

fn filter_directives(log_level: &str) -> String {
    NOISY_MODULES
        .iter()
        .fold(String::from(log_level), |mut directives, module| {
            directives.push_str(&format!(",{module}=warn"));
            directives
        })
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)))
}

/// Installs a global subscriber. A second call is a no-op.
pub fn init_logging(log_level: &str, log_format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    let installed = match log_format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true);
            subscriber.with(layer).try_init().is_ok()
        }
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(true);
            subscriber.with(layer).try_init().is_ok()
        }
    };

    if installed {
        tracing::info!(%log_level, %log_format, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noisy_modules_are_capped_at_warn() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
