//! Container configuration.
//!
//! Settings come from code, from the environment (`WEAVE_DI_*` variables)
//! or, with the `config` feature, from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Environment variable toggling miss diagnostics.
pub const ENV_LOG_ON_MISS: &str = "WEAVE_DI_LOG_ON_MISS";
/// Environment variable bounding nested resolution depth.
pub const ENV_MAX_DEPTH: &str = "WEAVE_DI_MAX_DEPTH";

const DEFAULT_MAX_DEPTH: usize = 1024;

/// Behavior switches for a [`DiContainer`](crate::DiContainer).
///
/// Children created with [`create_child`](crate::DiContainer::create_child)
/// inherit their parent's configuration.
///
/// # Examples
///
/// ```
/// use weave_di::{DiConfig, DiContainer, Resolver};
///
/// let quiet = DiConfig::default().log_on_miss(false);
/// let container = DiContainer::with_config(quiet);
/// assert!(!container.config().log_on_miss);
/// assert!(container.resolve::<u8>().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DiConfig {
    /// Report misses of plain `resolve` calls.
    pub log_on_miss: bool,
    /// Maximum nesting of producers resolving other producers on one thread.
    pub max_resolution_depth: usize,
}

impl Default for DiConfig {
    fn default() -> Self {
        Self {
            log_on_miss: true,
            max_resolution_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DiConfig {
    pub fn log_on_miss(mut self, enabled: bool) -> Self {
        self.log_on_miss = enabled;
        self
    }

    pub fn max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// Defaults overridden by `WEAVE_DI_LOG_ON_MISS` and `WEAVE_DI_MAX_DEPTH`.
    ///
    /// Unset variables keep their defaults; malformed values are an error.
    pub fn from_env() -> DiResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_LOG_ON_MISS) {
            config.log_on_miss = parse_bool(&raw).ok_or_else(|| {
                DiError::Configuration(format!("{} must be a boolean, got {:?}", ENV_LOG_ON_MISS, raw))
            })?;
        }

        if let Ok(raw) = env::var(ENV_MAX_DEPTH) {
            config.max_resolution_depth = raw.trim().parse().map_err(|_| {
                DiError::Configuration(format!("{} must be a positive integer, got {:?}", ENV_MAX_DEPTH, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    ///
    /// ```
    /// use weave_di::DiConfig;
    ///
    /// let config = DiConfig::from_json_str(r#"{ "log_on_miss": false }"#).unwrap();
    /// assert!(!config.log_on_miss);
    /// assert_eq!(config.max_resolution_depth, DiConfig::default().max_resolution_depth);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DiError::Configuration(format!("invalid container config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DiResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(DiError::Configuration("max_resolution_depth must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var(ENV_LOG_ON_MISS);
        env::remove_var(ENV_MAX_DEPTH);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        clear_env();
        env::set_var(ENV_LOG_ON_MISS, "off");
        env::set_var(ENV_MAX_DEPTH, "64");

        let config = DiConfig::from_env().unwrap();
        assert!(!config.log_on_miss);
        assert_eq!(config.max_resolution_depth, 64);
        clear_env();
    }

    #[test]
    #[serial]
    fn env_rejects_garbage() {
        clear_env();
        env::set_var(ENV_LOG_ON_MISS, "maybe");
        assert!(matches!(DiConfig::from_env(), Err(DiError::Configuration(_))));

        clear_env();
        env::set_var(ENV_MAX_DEPTH, "0");
        assert!(matches!(DiConfig::from_env(), Err(DiError::Configuration(_))));
        clear_env();
    }

    #[test]
    #[serial]
    fn unset_env_yields_defaults() {
        clear_env();
        assert_eq!(DiConfig::from_env().unwrap(), DiConfig::default());
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_round_trip_keeps_fields() {
        let config = DiConfig::default().log_on_miss(false).max_resolution_depth(12);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(DiConfig::from_json_str(&json).unwrap(), config);
        assert!(DiConfig::from_json_str("not json").is_err());
    }
}
