//! TOML configuration loader with validation.
//!
//! Loads [`EcuConfig`] from a single TOML file and validates parameter
//! bounds from the operator CLI contract: `timing_advance` clamped to
//! 0..40 degrees, `fuel_msec` clamped to 0..20 milliseconds. A dedicated
//! error enum with a `Display` impl per variant; `thiserror` is used
//! only where a variant wraps a foreign error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wheel::WheelPattern;

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Root ECU configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcuConfig {
    /// Which trigger wheel is installed.
    pub wheel: WheelPattern,
    /// Whether the timing-advance-enabled scheduler mode is used at
    /// boot. Mutable afterwards via the `s` CLI command.
    pub timing_advance_enabled: bool,
    /// Initial timing advance in degrees BTDC, clamped to `0..=40`.
    pub timing_advance_deg: u8,
    /// Initial fuel pulse width in milliseconds, clamped to `0..=20`.
    pub fuel_msec: u8,
    /// Whether the wasted-spark→sequential trim runs automatically.
    pub trim_flag: bool,
    /// Engine-loop tooth-wait timeout once `Run` has been reached, in
    /// microseconds (100 ms).
    pub engine_timeout_us: u64,
    /// Watchdog feed cadence, in milliseconds (100 ms).
    pub watchdog_feed_ms: u64,
}

impl Default for EcuConfig {
    fn default() -> Self {
        Self {
            wheel: WheelPattern::Hyundai602,
            timing_advance_enabled: false,
            timing_advance_deg: 0,
            fuel_msec: 2,
            trim_flag: false,
            engine_timeout_us: 100_000,
            watchdog_feed_ms: 100,
        }
    }
}

/// Maximum timing advance accepted by the CLI/config, in degrees BTDC.
pub const MAX_TIMING_ADVANCE_DEG: u8 = 40;
/// Maximum fuel pulse width accepted by the CLI/config, in milliseconds.
pub const MAX_FUEL_MSEC: u8 = 20;

// The BTDC-140 anchor event must fire strictly before the advance-enabled
// fallback close at BTDC-10, for any advance the CLI can dial in.
static_assertions::const_assert!(MAX_TIMING_ADVANCE_DEG < 140 - 10);

impl EcuConfig {
    /// Validate parameter bounds. Called after parsing and on every CLI
    /// mutation of `timing_advance_deg`/`fuel_msec`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing_advance_deg > MAX_TIMING_ADVANCE_DEG {
            return Err(ConfigError::Validation(format!(
                "timing_advance_deg {} exceeds max {MAX_TIMING_ADVANCE_DEG}",
                self.timing_advance_deg
            )));
        }
        if self.fuel_msec > MAX_FUEL_MSEC {
            return Err(ConfigError::Validation(format!(
                "fuel_msec {} exceeds max {MAX_FUEL_MSEC}",
                self.fuel_msec
            )));
        }
        if self.engine_timeout_us == 0 {
            return Err(ConfigError::Validation(
                "engine_timeout_us must be nonzero".into(),
            ));
        }
        if self.watchdog_feed_ms == 0 {
            return Err(ConfigError::Validation(
                "watchdog_feed_ms must be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: EcuConfig = toml::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_validates() {
        assert!(EcuConfig::default().validate().is_ok());
    }

    #[test]
    fn timing_advance_over_max_rejected() {
        let mut cfg = EcuConfig::default();
        cfg.timing_advance_deg = 41;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn fuel_msec_over_max_rejected() {
        let mut cfg = EcuConfig::default();
        cfg.fuel_msec = 21;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_round_trips_through_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            wheel = "hyundai602"
            timing_advance_enabled = true
            timing_advance_deg = 12
            fuel_msec = 3
            trim_flag = true
            engine_timeout_us = 100000
            watchdog_feed_ms = 100
            "#
        )
        .unwrap();

        let cfg = EcuConfig::load(file.path()).unwrap();
        assert_eq!(cfg.wheel, WheelPattern::Hyundai602);
        assert!(cfg.timing_advance_enabled);
        assert_eq!(cfg.timing_advance_deg, 12);
        assert_eq!(cfg.fuel_msec, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EcuConfig::load(Path::new("/nonexistent/ecu.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "this is not valid toml {{{{").unwrap();
        let err = EcuConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
