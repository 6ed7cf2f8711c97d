//! Workflow configuration.

use std::time::Duration;

use crate::error::{FlowError, FlowResult};

/// Default period between status probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Workflow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Period between status probes while a job is pending
    pub poll_interval: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl FlowConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FlowResult<Self> {
        let poll_interval = match std::env::var("AUGUR_POLL_INTERVAL_MS") {
            Ok(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| FlowError::config(format!("AUGUR_POLL_INTERVAL_MS is not a number: {}", raw)))?;
                if ms == 0 {
                    return Err(FlowError::config("AUGUR_POLL_INTERVAL_MS must be greater than zero"));
                }
                Duration::from_millis(ms)
            }
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self { poll_interval })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_poll_interval() {
        std::env::remove_var("AUGUR_POLL_INTERVAL_MS");
        let config = FlowConfig::from_env().unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    #[serial]
    fn test_poll_interval_from_env() {
        std::env::set_var("AUGUR_POLL_INTERVAL_MS", "250");
        let config = FlowConfig::from_env().unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        std::env::remove_var("AUGUR_POLL_INTERVAL_MS");
    }

    #[test]
    #[serial]
    fn test_zero_poll_interval_rejected() {
        std::env::set_var("AUGUR_POLL_INTERVAL_MS", "0");
        assert!(matches!(FlowConfig::from_env(), Err(FlowError::Config(_))));
        std::env::remove_var("AUGUR_POLL_INTERVAL_MS");
    }
}
