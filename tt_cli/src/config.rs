//! Host configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. Command-line flags override the environment.

use std::path::PathBuf;
use tt_engine::EngineConfig;

/// Complete host configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Tournament snapshot file
    pub snapshot: PathBuf,
    /// Engine knobs
    pub engine: EngineConfig,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if no snapshot path is given on the command line or in
    /// `TT_SNAPSHOT`.
    pub fn from_env(snapshot_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let snapshot = snapshot_override
            .or_else(|| std::env::var("TT_SNAPSHOT").ok().map(PathBuf::from))
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "TT_SNAPSHOT".to_string(),
                hint: "Pass --file PATH or set TT_SNAPSHOT in .env".to_string(),
            })?;

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            qualifiers_per_group: parse_env_or(
                "TT_QUALIFIERS_PER_GROUP",
                defaults.qualifiers_per_group,
            ),
            group_position_stride: parse_env_or(
                "TT_GROUP_POSITION_STRIDE",
                defaults.group_position_stride,
            ),
        };

        Ok(CliConfig {
            snapshot,
            engine,
            pretty: parse_env_or("TT_PRETTY_JSON", true),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                var: "TT_SNAPSHOT".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.engine.qualifiers_per_group > 8 {
            return Err(ConfigError::Invalid {
                var: "TT_QUALIFIERS_PER_GROUP".to_string(),
                reason: "Must be at most 8".to_string(),
            });
        }

        self.engine.validate().map_err(|reason| ConfigError::Invalid {
            var: "TT_QUALIFIERS_PER_GROUP / TT_GROUP_POSITION_STRIDE".to_string(),
            reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
