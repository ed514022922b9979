//! Configuration management for the election engine
//!
//! Loads configuration from environment variables with validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration for store access and device notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded timeout for every store access, in milliseconds.
    /// An access that exceeds it fails with `Unavailable` instead of
    /// hanging (default: 10 seconds).
    pub store_timeout_ms: u64,

    /// Capacity of the outbound device notification queue. When the
    /// queue is full, further notifications are dropped with a warning;
    /// engine operations never block on it (default: 64).
    pub device_channel_capacity: usize,
}

impl EngineConfig {
    /// Load engine configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_timeout_ms = std::env::var("ENGINE_STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|_| Error::internal("Invalid ENGINE_STORE_TIMEOUT_MS"))?;

        let device_channel_capacity = std::env::var("ENGINE_DEVICE_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| "64".to_string())
            .parse()
            .map_err(|_| Error::internal("Invalid ENGINE_DEVICE_CHANNEL_CAPACITY"))?;

        let config = Self {
            store_timeout_ms,
            device_channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            store_timeout_ms: 2_000,
            device_channel_capacity: 32,
        }
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_ms == 0 {
            return Err(Error::internal("ENGINE_STORE_TIMEOUT_MS must be positive"));
        }
        if self.device_channel_capacity == 0 {
            return Err(Error::internal(
                "ENGINE_DEVICE_CHANNEL_CAPACITY must be positive",
            ));
        }
        Ok(())
    }

    /// Store access timeout as a [`Duration`]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let engine = EngineConfig::from_env()?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        };

        Ok(Self { engine, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            engine: EngineConfig::for_testing(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_validation() {
        let config = EngineConfig::for_testing();
        assert!(config.validate().is_ok());
        assert!(config.store_timeout() > Duration::ZERO);

        let zero_timeout = EngineConfig {
            store_timeout_ms: 0,
            ..EngineConfig::for_testing()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_capacity = EngineConfig {
            device_channel_capacity: 0,
            ..EngineConfig::for_testing()
        };
        assert!(zero_capacity.validate().is_err());
    }

    #[test]
    fn test_config_for_testing() {
        let config = Config::for_testing();
        assert!(config.engine.device_channel_capacity > 0);
        assert_eq!(config.logging.level, "debug");
    }
}
