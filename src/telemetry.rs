use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidLevel { level: String, source: ParseError },
    /// A global subscriber was installed earlier in this process.
    AlreadyInitialized,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidLevel { level, .. } => write!(f, "invalid log level '{}'", level),
            TelemetryError::AlreadyInitialized => f.write_str("logging already initialised"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidLevel { source, .. } => Some(source),
            TelemetryError::AlreadyInitialized => None,
        }
    }
}

/// `RUST_LOG` wins over the configured level.
pub fn log_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|source| TelemetryError::InvalidLevel {
        level: config.level.clone(),
        source,
    })
}

/// Logs go to stderr so `--json` output stays clean.
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(config)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        let config = LoggingConfig {
            level: "admit_fit=debug,warn".to_string(),
        };
        assert!(log_filter(&config).is_ok());
    }

    #[test]
    fn malformed_level_is_reported() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "admit_fit=loud".to_string(),
        };
        match log_filter(&config) {
            Err(TelemetryError::InvalidLevel { level, .. }) => assert_eq!(level, "admit_fit=loud"),
            other => panic!("expected invalid level, got {:?}", other.map(|_| ())),
        }
    }
}
