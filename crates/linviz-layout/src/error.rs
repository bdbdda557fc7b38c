#![forbid(unsafe_code)]

//! Layout failures.
//!
//! Both kinds are fatal for the render in progress. There is no partial
//! result: callers re-run the analysis with different windowing instead of
//! retrying the same input.

use std::fmt;

use linviz_core::{HistoryError, Process};

use crate::config::LayoutConfigError;
use crate::placer::LineId;

/// Malformed or inconsistent input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The history failed validation or pairing.
    History(HistoryError),
    /// An operation references a process outside the declared set.
    UnknownProcess { process: Process, index: usize },
    /// A process was declared more than once.
    DuplicateProcess(Process),
    /// An operation is not the one stored at its index in the history.
    UnknownOperation { index: usize },
    /// A transition's operation has no time coordinates.
    MissingCoordinates { index: usize },
    /// The line remap table loops back on itself.
    RemapCycle { id: LineId },
    /// The layout config failed validation.
    InvalidConfig(Vec<LayoutConfigError>),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History(err) => write!(f, "invalid history: {err}"),
            Self::UnknownProcess { process, index } => {
                write!(f, "operation {index} references unknown process {process}")
            }
            Self::DuplicateProcess(process) => {
                write!(f, "process {process} declared more than once")
            }
            Self::UnknownOperation { index } => {
                write!(f, "operation {index} does not match the history")
            }
            Self::MissingCoordinates { index } => {
                write!(f, "operation {index} has no time coordinates")
            }
            Self::RemapCycle { id } => write!(f, "line remap cycle through line {id}"),
            Self::InvalidConfig(errors) => {
                f.write_str("invalid layout config: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::History(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HistoryError> for ConfigurationError {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}

/// No placement exists within an operation's time bound.
///
/// Ticks are in units of `1 / step_divisions` of a condensed time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOverflowError {
    /// Index of the transition's operation.
    pub op_index: usize,
    pub track: usize,
    pub min_tick: i64,
    pub max_tick: i64,
    /// First candidate that fell outside `[min_tick, max_tick]`.
    pub candidate: i64,
    pub step_divisions: u32,
}

impl fmt::Display for LayoutOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let div = f64::from(self.step_divisions);
        write!(
            f,
            "no room to place operation {} on track {}: candidate x={} exceeds bound [{}, {}]",
            self.op_index,
            self.track,
            self.candidate as f64 / div,
            self.min_tick as f64 / div,
            self.max_tick as f64 / div,
        )
    }
}

impl std::error::Error for LayoutOverflowError {}

/// Any failure of the layout pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Configuration(ConfigurationError),
    Overflow(LayoutOverflowError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "configuration error: {err}"),
            Self::Overflow(err) => write!(f, "layout overflow: {err}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Overflow(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for LayoutError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

impl From<HistoryError> for LayoutError {
    fn from(err: HistoryError) -> Self {
        Self::Configuration(err.into())
    }
}

impl From<LayoutOverflowError> for LayoutError {
    fn from(err: LayoutOverflowError) -> Self {
        Self::Overflow(err)
    }
}
