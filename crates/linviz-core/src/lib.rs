#![forbid(unsafe_code)]

//! Core: operations, histories, models, and analyses for linviz.
//!
//! # Role in linviz
//! `linviz-core` is the input layer. It owns the operation and history
//! types handed over by the external analyzer, the pair index derived from
//! a history, and the drawing-surface geometry shared with backends.
//!
//! # Primary responsibilities
//! - **Operation / Process**: events and the actors performing them.
//! - **History / PairIndex**: indexed timelines and invocation pairing.
//! - **Model / Transition / Analysis**: candidate explanations.
//!
//! # How it fits in the system
//! The layout engine (`linviz-layout`) consumes a [`History`] and an
//! [`Analysis`] and produces drawable coordinates. Nothing here performs
//! I/O.

pub mod analysis;
pub mod geometry;
pub mod history;
pub mod model;
pub mod op;

pub use analysis::{Analysis, Path, Transition};
pub use geometry::{LayoutPoint, LayoutRect};
pub use history::{History, HistoryError, PairIndex};
pub use model::{CasRegister, Model, Register};
pub use op::{OpType, Operation, Process, Value};
