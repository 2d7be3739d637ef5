//! Error types for landlord-dedup

use thiserror::Error;

/// Result type alias for deduplication operations
pub type Result<T> = std::result::Result<T, DedupError>;

/// Main error type for the engine.
///
/// Batches never fail on degenerate data; only construction does.
#[derive(Error, Debug)]
pub enum DedupError {
    /// Invalid detector or pipeline configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value is out of its valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Every similarity algorithm is disabled or weighted zero
    #[error("No similarity algorithm is enabled with a positive weight")]
    NoAlgorithmsEnabled,

    /// Weight is negative or not finite
    #[error("Invalid weight for {algorithm}: {weight}")]
    InvalidWeight { algorithm: String, weight: f64 },

    /// Blocking strategy cannot produce keys
    #[error("Invalid blocking strategy: {0}")]
    InvalidBlocking(String),

    /// A configured table could not be compiled into a pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<regex::Error> for ConfigError {
    fn from(err: regex::Error) -> Self {
        ConfigError::InvalidPattern(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(feature = "toml-config")]
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
