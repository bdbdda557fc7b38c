#![forbid(unsafe_code)]

//! Layout configuration.
//!
//! Environment variables:
//! - `LINVIZ_STEP_DIVISIONS` (ticks per condensed time unit, >= 1)
//! - `LINVIZ_X_SCALE` (surface units per time unit, > 0)
//! - `LINVIZ_Y_SCALE` (surface units per process track, > 0)
//! - `LINVIZ_BAR_HEIGHT` (fraction of a track covered by an operation bar, in (0, 1])

use std::env;
use std::fmt;

use serde::Serialize;

const ENV_STEP_DIVISIONS: &str = "LINVIZ_STEP_DIVISIONS";
const ENV_X_SCALE: &str = "LINVIZ_X_SCALE";
const ENV_Y_SCALE: &str = "LINVIZ_Y_SCALE";
const ENV_BAR_HEIGHT: &str = "LINVIZ_BAR_HEIGHT";

/// Parameters of one render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutConfig {
    /// Collision probes per condensed time unit. One placement step is
    /// `1 / step_divisions` of a time unit.
    pub step_divisions: u32,
    /// Horizontal scale factor applied by the backend.
    pub x_scale: f64,
    /// Vertical scale factor applied by the backend.
    pub y_scale: f64,
    /// Height of an operation bar as a fraction of a track.
    pub bar_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            step_divisions: 6,
            x_scale: 150.0,
            y_scale: 60.0,
            bar_height: 0.8,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct LayoutConfigParse {
    pub config: LayoutConfig,
    pub errors: Vec<LayoutConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl LayoutConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for LayoutConfigError {}

impl LayoutConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> LayoutConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> LayoutConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<LayoutConfigError>> {
        let mut errors = Vec::new();
        if self.step_divisions == 0 {
            errors.push(LayoutConfigError::new(
                "step_divisions",
                "0",
                "must be at least 1",
            ));
        }
        validate_scale("x_scale", self.x_scale, &mut errors);
        validate_scale("y_scale", self.y_scale, &mut errors);
        if !(self.bar_height > 0.0 && self.bar_height <= 1.0) {
            errors.push(LayoutConfigError::new(
                "bar_height",
                self.bar_height.to_string(),
                "must be in (0, 1]",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_scale(field: &'static str, value: f64, errors: &mut Vec<LayoutConfigError>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(LayoutConfigError::new(
            field,
            value.to_string(),
            "must be finite and positive",
        ));
    }
}

fn from_env_with<F>(mut get: F) -> LayoutConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = LayoutConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_STEP_DIVISIONS) {
        match value.trim().parse::<u32>() {
            Ok(parsed) => config.step_divisions = parsed,
            Err(_) => errors.push(LayoutConfigError::new(
                "step_divisions",
                value,
                "expected unsigned integer",
            )),
        }
    }
    if let Some(value) = get(ENV_X_SCALE) {
        match value.trim().parse::<f64>() {
            Ok(parsed) => config.x_scale = parsed,
            Err(_) => errors.push(LayoutConfigError::new("x_scale", value, "expected number")),
        }
    }
    if let Some(value) = get(ENV_Y_SCALE) {
        match value.trim().parse::<f64>() {
            Ok(parsed) => config.y_scale = parsed,
            Err(_) => errors.push(LayoutConfigError::new("y_scale", value, "expected number")),
        }
    }
    if let Some(value) = get(ENV_BAR_HEIGHT) {
        match value.trim().parse::<f64>() {
            Ok(parsed) => config.bar_height = parsed,
            Err(_) => errors.push(LayoutConfigError::new(
                "bar_height",
                value,
                "expected number",
            )),
        }
    }

    // Parsed values that fail validation fall back like unparsable ones.
    if let Err(mut invalid) = config.validate() {
        let defaults = LayoutConfig::default();
        for err in &invalid {
            match err.field {
                "step_divisions" => config.step_divisions = defaults.step_divisions,
                "x_scale" => config.x_scale = defaults.x_scale,
                "y_scale" => config.y_scale = defaults.y_scale,
                "bar_height" => config.bar_height = defaults.bar_height,
                _ => {}
            }
        }
        errors.append(&mut invalid);
    }

    LayoutConfigParse { config, errors }
}
