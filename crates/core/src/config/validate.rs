use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Device section exists (enforced by serde)
/// - Device URL is not empty
/// - Polling intervals are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.device.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "device.url cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.ready_poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.ready_poll_interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::orchestrator::OrchestratorConfig;

    fn config_with_url(url: &str) -> Config {
        Config {
            device: DeviceConfig {
                url: url.to_string(),
                timeout_secs: 30,
            },
            orchestrator: OrchestratorConfig::default(),
            family: None,
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config_with_url("http://printer")).is_ok());
    }

    #[test]
    fn test_validate_empty_url_fails() {
        let result = validate_config(&config_with_url("  "));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = config_with_url("http://printer");
        config.orchestrator.ready_poll_interval_ms = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
    }
}
