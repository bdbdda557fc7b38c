#![forbid(unsafe_code)]

//! Timeline layout for linearizability analyses.
//!
//! Turns the candidate explanation paths of an [`Analysis`] into drawable
//! geometry: operation bars on per-process tracks, and deduplicated lines
//! between the model states each path passes through.
//!
//! # Pipeline
//!
//! 1. [`coords`]: per-process tracks and condensed time spans.
//! 2. [`annotate`]: track and time bound on every transition.
//! 3. [`placer`]: collision-free horizontal placement and line emission.
//! 4. [`dedup`]: merge identical lines across paths.
//! 5. [`assemble`]: compose the above into a [`LayoutResult`].
//!
//! # Example
//!
//! ```
//! use linviz_core::{Analysis, History, Operation, Register, Transition, Value};
//! use linviz_layout::{LayoutConfig, layout};
//!
//! let history = History::new(vec![
//!     Operation::invoke(0, 0u64, "write", 1i64),
//!     Operation::ok(1, 0u64, "write", 1i64),
//!     Operation::invoke(2, 1u64, "read", Value::Nil),
//!     Operation::ok(3, 1u64, "read", 1i64),
//! ])
//! .unwrap();
//! let analysis = Analysis::new(history.get(3).unwrap().clone()).path(vec![
//!     Transition::new(history.get(1).unwrap().clone(), Register::new(1i64)),
//!     Transition::new(history.get(3).unwrap().clone(), Register::new(1i64)),
//! ]);
//!
//! let result = layout(history, &analysis, &LayoutConfig::default()).unwrap();
//! assert_eq!(result.bars.len(), 2);
//! assert_eq!(result.lines.len(), 1);
//! ```
//!
//! All output is deterministic: identical input produces identical layout.
//!
//! [`Analysis`]: linviz_core::Analysis

pub mod annotate;
pub mod assemble;
pub mod config;
pub mod coords;
pub mod dedup;
pub mod error;
pub mod placer;
pub mod scale;

pub use annotate::{AnnotatedTransition, annotate_path, annotate_paths};
pub use assemble::{LayoutResult, OperationBar, PlacedModel, layout};
pub use config::{LayoutConfig, LayoutConfigError, LayoutConfigParse};
pub use coords::{
    ProcessCoords, TimeBounds, TimeCoords, TimeSpan, condense, process_coordinates,
    process_coordinates_declared, time_bounds, time_coordinates,
};
pub use dedup::{DedupReport, LineRemap, apply_remap, dedup_lines, deduplicate};
pub use error::{ConfigurationError, LayoutError, LayoutOverflowError};
pub use placer::{GridPoint, Line, LineId, LinePlacer, PlacedTransition, PlacementGrid};
pub use scale::LayoutScale;
