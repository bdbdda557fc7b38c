#![forbid(unsafe_code)]

//! Results of the linearizability search, as consumed by layout.

use serde::Serialize;

use crate::model::Model;
use crate::op::Operation;

/// An operation paired with the model state it produces along a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Transition<M> {
    pub op: Operation,
    pub model: M,
    /// The model rejected `op`; `model` is the inconsistent state.
    pub rejected: bool,
}

impl<M: Model> Transition<M> {
    /// A transition the model accepted.
    #[must_use]
    pub fn new(op: Operation, model: M) -> Self {
        Self {
            op,
            model,
            rejected: false,
        }
    }

    /// A transition the model rejected.
    #[must_use]
    pub fn rejected(op: Operation, model: M) -> Self {
        Self {
            op,
            model,
            rejected: true,
        }
    }
}

/// One candidate explanation, in the order the model consumed operations.
pub type Path<M> = Vec<Transition<M>>;

/// The search result handed to layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis<M> {
    /// Candidate explanations.
    pub final_paths: Vec<Path<M>>,
    /// The final operation considered.
    pub op: Operation,
    /// The last operation known to be consistent before `op`.
    pub previous_ok: Option<Operation>,
}

impl<M: Model> Analysis<M> {
    #[must_use]
    pub fn new(op: Operation) -> Self {
        Self {
            final_paths: Vec::new(),
            op,
            previous_ok: None,
        }
    }

    #[must_use]
    pub fn previous_ok(mut self, op: Operation) -> Self {
        self.previous_ok = Some(op);
        self
    }

    #[must_use]
    pub fn path(mut self, path: Path<M>) -> Self {
        self.final_paths.push(path);
        self
    }

    /// Total number of transitions across all paths.
    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.final_paths.iter().map(Vec::len).sum()
    }
}
