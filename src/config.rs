//! # Tracker Configuration
//!
//! Tunable constants of the edit tracker, with YAML loading.
//!
//! ## YAML Format
//! Every key is optional; missing keys keep their defaults.
//!
//! ```yaml
//! samples-per-second: 20
//! lookup-window: 0.05
//! chord-tolerance: 0.05
//! label-velocity: 20
//! default-coarse-code: 0
//! default-fine-code: 0
//! coarse-codes:
//!   rollback: 25
//! fine-codes:
//!   go_back: 5
//! ```
//!
//! ## Example
//! ```rust
//! use mistaker::TrackerConfig;
//!
//! let config = TrackerConfig::from_yaml("lookup-window: 0.1")?;
//! assert_eq!(config.lookup_window, 0.1);
//! assert_eq!(config.samples_per_second, 20.0);
//! # Ok::<(), mistaker::MistakeError>(())
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::category::{CodeTable, CoarseCategory, FineCategory};
use crate::error::MistakeError;

pub const DEFAULT_SAMPLES_PER_SECOND: f64 = 20.0;
/// Half-width of the window searched around a resolved time when looking up a pitch.
pub const DEFAULT_LOOKUP_WINDOW: f64 = 0.05;
pub const DEFAULT_CHORD_TOLERANCE: f64 = 0.05;
pub const DEFAULT_LABEL_VELOCITY: u8 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Time grid resolution
    pub samples_per_second: f64,
    pub lookup_window: f64,
    /// Onsets closer than this to the first onset of a chord belong to that chord
    pub chord_tolerance: f64,
    pub label_velocity: u8,
    pub codes: CodeTable,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            samples_per_second: DEFAULT_SAMPLES_PER_SECOND,
            lookup_window: DEFAULT_LOOKUP_WINDOW,
            chord_tolerance: DEFAULT_CHORD_TOLERANCE,
            label_velocity: DEFAULT_LABEL_VELOCITY,
            codes: CodeTable::default(),
        }
    }
}

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub samples_per_second: Option<f64>,
    pub lookup_window: Option<f64>,
    pub chord_tolerance: Option<f64>,
    pub label_velocity: Option<u8>,
    pub default_coarse_code: Option<u8>,
    pub default_fine_code: Option<u8>,
    #[serde(default)]
    pub coarse_codes: HashMap<String, u8>,
    #[serde(default)]
    pub fine_codes: HashMap<String, u8>,
}

impl TrackerConfig {
    pub fn from_yaml(content: &str) -> Result<Self, MistakeError> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| MistakeError::ConfigError(e.to_string()))?;
        TrackerConfig::try_from(raw)
    }
}

impl TryFrom<RawConfig> for TrackerConfig {
    type Error = MistakeError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut config = TrackerConfig::default();

        if let Some(sps) = raw.samples_per_second {
            if !sps.is_finite() || sps <= 0.0 {
                return Err(MistakeError::ConfigError(format!(
                    "samples-per-second must be positive, got {}",
                    sps
                )));
            }
            config.samples_per_second = sps;
        }
        if let Some(window) = raw.lookup_window {
            if !window.is_finite() || window < 0.0 {
                return Err(MistakeError::ConfigError(format!(
                    "lookup-window must be non-negative, got {}",
                    window
                )));
            }
            config.lookup_window = window;
        }
        if let Some(tolerance) = raw.chord_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(MistakeError::ConfigError(format!(
                    "chord-tolerance must be non-negative, got {}",
                    tolerance
                )));
            }
            config.chord_tolerance = tolerance;
        }
        if let Some(velocity) = raw.label_velocity {
            if velocity > 127 {
                return Err(MistakeError::ConfigError(format!(
                    "label-velocity must be within 0-127, got {}",
                    velocity
                )));
            }
            config.label_velocity = velocity;
        }
        if let Some(code) = raw.default_coarse_code {
            config.codes.default_coarse = label_code("default-coarse-code", code)?;
        }
        if let Some(code) = raw.default_fine_code {
            config.codes.default_fine = label_code("default-fine-code", code)?;
        }
        for (name, code) in raw.coarse_codes {
            let code = label_code(&name, code)?;
            config.codes.set_coarse(CoarseCategory::from(name), code);
        }
        for (name, code) in raw.fine_codes {
            let code = label_code(&name, code)?;
            config.codes.set_fine(FineCategory::from(name), code);
        }

        Ok(config)
    }
}

/// Label codes become MIDI pitches, so they share the 0-127 range.
fn label_code(name: &str, code: u8) -> Result<u8, MistakeError> {
    if code > 127 {
        return Err(MistakeError::ConfigError(format!(
            "code for {} must be within 0-127, got {}",
            name, code
        )));
    }
    Ok(code)
}
