#![forbid(unsafe_code)]

//! Completed, indexed histories and the invocation/completion pair index.
//!
//! # Invariants
//!
//! 1. **Indexed**: the operation at position `i` of a [`History`] has
//!    `index == i`. Construction rejects anything else.
//!
//! 2. **Pairing is per process**: an invocation pairs with the next
//!    completion by the same process. A process never has two open
//!    invocations at once.
//!
//! 3. **Read-only**: neither structure is mutated after construction.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unindexed op | `ops[i].index != i` | `HistoryError::UnindexedOperation` |
//! | Orphan completion | completion with no open invocation | `HistoryError::UnmatchedCompletion` |
//! | Overlap | second invocation while one is open | `HistoryError::OverlappingInvocation` |
//! | Dangling invocation | never completed | Allowed; completion is `None` |

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::op::{Operation, Process};

/// Errors from history validation and pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// An operation's index does not match its position.
    UnindexedOperation { position: usize, index: usize },
    /// A completion arrived for a process with no open invocation.
    UnmatchedCompletion { index: usize, process: Process },
    /// A process invoked again before its previous invocation completed.
    OverlappingInvocation {
        open: usize,
        index: usize,
        process: Process,
    },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnindexedOperation { position, index } => {
                write!(f, "operation at position {position} has index {index}")
            }
            Self::UnmatchedCompletion { index, process } => write!(
                f,
                "completion {index} by process {process} has no open invocation"
            ),
            Self::OverlappingInvocation {
                open,
                index,
                process,
            } => write!(
                f,
                "process {process} invoked {index} while {open} was still open"
            ),
        }
    }
}

impl std::error::Error for HistoryError {}

/// An ordered, indexed sequence of operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    ops: Vec<Operation>,
}

impl History {
    /// Wrap an already-indexed sequence of operations.
    pub fn new(ops: Vec<Operation>) -> Result<Self, HistoryError> {
        if let Some((position, op)) = ops.iter().enumerate().find(|(i, op)| op.index != *i) {
            return Err(HistoryError::UnindexedOperation {
                position,
                index: op.index,
            });
        }
        Ok(Self { ops })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.ops.get(index)
    }

    /// Whether `op` is exactly the operation stored at its index.
    #[must_use]
    pub fn contains(&self, op: &Operation) -> bool {
        self.ops.get(op.index) == Some(op)
    }

    #[must_use]
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.ops.iter()
    }
}

/// Lookup from an invocation to its completion and back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairIndex {
    /// `partner[i]` is the index paired with operation `i`, if any.
    partner: Vec<Option<usize>>,
    /// Whether operation `i` is an invocation.
    invoke: Vec<bool>,
}

impl PairIndex {
    /// Pair every invocation in `history` with its completion.
    pub fn new(history: &History) -> Result<Self, HistoryError> {
        let mut partner = vec![None; history.len()];
        let mut invoke = vec![false; history.len()];
        let mut open: FxHashMap<&Process, usize> = FxHashMap::default();

        for op in history.iter() {
            if op.is_invoke() {
                if let Some(&prior) = open.get(&op.process) {
                    return Err(HistoryError::OverlappingInvocation {
                        open: prior,
                        index: op.index,
                        process: op.process.clone(),
                    });
                }
                invoke[op.index] = true;
                open.insert(&op.process, op.index);
            } else {
                let Some(inv) = open.remove(&op.process) else {
                    return Err(HistoryError::UnmatchedCompletion {
                        index: op.index,
                        process: op.process.clone(),
                    });
                };
                partner[inv] = Some(op.index);
                partner[op.index] = Some(inv);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            ops = history.len(),
            dangling = open.len(),
            "pair index: history paired"
        );

        Ok(Self { partner, invoke })
    }

    /// Index of the invocation for `op` (itself when `op` is one).
    #[must_use]
    pub fn invocation(&self, op: &Operation) -> Option<usize> {
        if *self.invoke.get(op.index)? {
            Some(op.index)
        } else {
            self.partner[op.index]
        }
    }

    /// Index of the completion for `op` (itself when `op` is one).
    #[must_use]
    pub fn completion(&self, op: &Operation) -> Option<usize> {
        if *self.invoke.get(op.index)? {
            self.partner[op.index]
        } else {
            Some(op.index)
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.partner.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{OpType, Value};

    fn op(index: usize, process: u64, op_type: OpType) -> Operation {
        Operation::new(index, Process::Client(process), op_type, "write", Value::Int(1))
    }

    #[test]
    fn rejects_unindexed_history() {
        let err = History::new(vec![op(0, 0, OpType::Invoke), op(5, 0, OpType::Ok)]).unwrap_err();
        assert_eq!(
            err,
            HistoryError::UnindexedOperation {
                position: 1,
                index: 5
            }
        );
    }

    #[test]
    fn pairs_interleaved_processes() {
        let history = History::new(vec![
            op(0, 0, OpType::Invoke),
            op(1, 1, OpType::Invoke),
            op(2, 1, OpType::Ok),
            op(3, 0, OpType::Info),
        ])
        .unwrap();
        let pairs = PairIndex::new(&history).unwrap();

        let inv0 = history.get(0).unwrap();
        let done0 = history.get(3).unwrap();
        assert_eq!(pairs.completion(inv0), Some(3));
        assert_eq!(pairs.invocation(done0), Some(0));
        assert_eq!(pairs.invocation(inv0), Some(0));
        assert_eq!(pairs.completion(done0), Some(3));
        assert_eq!(pairs.completion(history.get(1).unwrap()), Some(2));
    }

    #[test]
    fn dangling_invocation_has_no_completion() {
        let history = History::new(vec![op(0, 0, OpType::Invoke)]).unwrap();
        let pairs = PairIndex::new(&history).unwrap();
        assert_eq!(pairs.completion(history.get(0).unwrap()), None);
    }

    #[test]
    fn orphan_completion_is_an_error() {
        let history = History::new(vec![op(0, 3, OpType::Ok)]).unwrap();
        assert!(matches!(
            PairIndex::new(&history),
            Err(HistoryError::UnmatchedCompletion { index: 0, .. })
        ));
    }

    #[test]
    fn overlapping_invocations_are_an_error() {
        let history =
            History::new(vec![op(0, 3, OpType::Invoke), op(1, 3, OpType::Invoke)]).unwrap();
        assert!(matches!(
            PairIndex::new(&history),
            Err(HistoryError::OverlappingInvocation { open: 0, index: 1, .. })
        ));
    }

    #[test]
    fn lookups_outside_history_are_none() {
        let history = History::new(vec![op(0, 0, OpType::Invoke)]).unwrap();
        let pairs = PairIndex::new(&history).unwrap();
        assert_eq!(pairs.invocation(&op(9, 0, OpType::Ok)), None);
    }

    #[test]
    fn contains_checks_identity_at_index() {
        let history = History::new(vec![op(0, 0, OpType::Invoke)]).unwrap();
        assert!(history.contains(&op(0, 0, OpType::Invoke)));
        assert!(!history.contains(&op(0, 1, OpType::Invoke)));
    }
}
