#![forbid(unsafe_code)]

//! Coordinate assignment: process tracks and condensed time spans.
//!
//! Tracks are dense integers `0, 1, 2, …`, one per process. Visual spacing
//! between tracks is the backend's vertical scale factor, not a gap in the
//! track numbering.
//!
//! Time is condensed: every distinct span endpoint is replaced by its rank
//! among all endpoints, so long quiet stretches of a history do not waste
//! horizontal space. Condensation is a strictly monotonic re-ranking; two
//! endpoints share a condensed value only if their raw values were equal.

use std::collections::BTreeMap;

use linviz_core::{Analysis, Model, Operation, PairIndex, Process};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::ConfigurationError;

/// Bijection from process to track index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessCoords {
    /// Processes in track order; position is the track.
    processes: Vec<Process>,
    #[serde(skip)]
    tracks: FxHashMap<Process, usize>,
}

impl ProcessCoords {
    fn from_ordered(processes: Vec<Process>) -> Self {
        let tracks = processes
            .iter()
            .enumerate()
            .map(|(track, p)| (p.clone(), track))
            .collect();
        Self { processes, tracks }
    }

    /// Track assigned to `process`.
    #[inline]
    #[must_use]
    pub fn track(&self, process: &Process) -> Option<usize> {
        self.tracks.get(process).copied()
    }

    /// Processes in track order.
    #[inline]
    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// Assign one track per distinct process, ordered by [`Process`]'s total
/// order (numeric clients, then named processes, then the nemesis).
#[must_use]
pub fn process_coordinates<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> ProcessCoords {
    let mut processes: Vec<Process> = ops
        .into_iter()
        .map(|op| &op.process)
        .collect::<FxHashSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    processes.sort();
    ProcessCoords::from_ordered(processes)
}

/// Assign tracks in the caller's declared process order.
///
/// Every process referenced by `ops` must be declared.
pub fn process_coordinates_declared<'a>(
    declared: impl IntoIterator<Item = Process>,
    ops: impl IntoIterator<Item = &'a Operation>,
) -> Result<ProcessCoords, ConfigurationError> {
    let mut seen = FxHashSet::default();
    let mut processes = Vec::new();
    for process in declared {
        if !seen.insert(process.clone()) {
            return Err(ConfigurationError::DuplicateProcess(process));
        }
        processes.push(process);
    }
    let coords = ProcessCoords::from_ordered(processes);
    for op in ops {
        if coords.track(&op.process).is_none() {
            return Err(ConfigurationError::UnknownProcess {
                process: op.process.clone(),
                index: op.index,
            });
        }
    }
    Ok(coords)
}

/// The window of history indices visible in a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBounds {
    pub lower: i64,
    pub upper: i64,
}

/// Compute the visible window for `analysis`.
///
/// Lower is one before the invocation of the last known-good operation
/// (0 when there is none); upper is one past the completion of the final
/// operation (or past the operation itself if it never completed).
pub fn time_bounds<M: Model>(
    pair_index: &PairIndex,
    analysis: &Analysis<M>,
) -> Result<TimeBounds, ConfigurationError> {
    let lower_invocation = match &analysis.previous_ok {
        Some(op) => pair_index
            .invocation(op)
            .ok_or(ConfigurationError::UnknownOperation { index: op.index })? as i64,
        None => 1,
    };
    if pair_index.invocation(&analysis.op).is_none() {
        return Err(ConfigurationError::UnknownOperation {
            index: analysis.op.index,
        });
    }
    let upper_completion = pair_index
        .completion(&analysis.op)
        .unwrap_or(analysis.op.index) as i64;
    Ok(TimeBounds {
        lower: lower_invocation - 1,
        upper: upper_completion + 1,
    })
}

/// A condensed `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSpan {
    pub start: i64,
    pub end: i64,
}

impl TimeSpan {
    #[inline]
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.end - self.start
    }
}

/// Condensed time spans keyed by invocation index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeCoords {
    spans: BTreeMap<usize, TimeSpan>,
    /// Number of distinct condensed values.
    ranks: usize,
}

impl TimeCoords {
    /// Span of the operation whose invocation has index `invocation`.
    #[inline]
    #[must_use]
    pub fn span(&self, invocation: usize) -> Option<TimeSpan> {
        self.spans.get(&invocation).copied()
    }

    /// Number of distinct condensed time values, `k`; the image is `0..k`.
    #[inline]
    #[must_use]
    pub fn ranks(&self) -> usize {
        self.ranks
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, TimeSpan)> + '_ {
        self.spans.iter().map(|(&k, &v)| (k, v))
    }
}

/// Re-rank raw spans so their endpoints form the contiguous range `0..k`.
#[must_use]
pub fn condense(raw: impl IntoIterator<Item = (usize, TimeSpan)>) -> TimeCoords {
    let raw: Vec<(usize, TimeSpan)> = raw.into_iter().collect();
    let mut points: Vec<i64> = raw.iter().flat_map(|(_, s)| [s.start, s.end]).collect();
    points.sort_unstable();
    points.dedup();

    let rank: FxHashMap<i64, i64> = points
        .iter()
        .enumerate()
        .map(|(i, &t)| (t, i as i64))
        .collect();

    let spans = raw
        .into_iter()
        .map(|(key, s)| (key, TimeSpan::new(rank[&s.start], rank[&s.end])))
        .collect();

    TimeCoords {
        spans,
        ranks: points.len(),
    }
}

/// Compute condensed spans for `ops` within `bounds`.
///
/// Each span starts at the later of the window's lower bound and the
/// invocation, and ends at the completion, or at the upper bound when the
/// operation did not complete inside the window. Spans never run backwards.
pub fn time_coordinates<'a>(
    pair_index: &PairIndex,
    bounds: TimeBounds,
    ops: impl IntoIterator<Item = &'a Operation>,
) -> Result<TimeCoords, ConfigurationError> {
    let mut raw = Vec::new();
    for op in ops {
        let invocation = pair_index
            .invocation(op)
            .ok_or(ConfigurationError::UnknownOperation { index: op.index })?;
        let t1 = bounds.lower.max(invocation as i64);
        let t2 = match pair_index.completion(op) {
            Some(c) if (c as i64) <= bounds.upper => c as i64,
            _ => bounds.upper,
        };
        let t2 = t2.max(t1);
        raw.push((
            invocation,
            TimeSpan::new(t1 - bounds.lower, t2 - bounds.lower),
        ));
    }
    Ok(condense(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linviz_core::{History, Register, Value};

    fn sequential(n: usize) -> History {
        let mut ops = Vec::new();
        for i in 0..n {
            let p = (i % 2) as u64;
            ops.push(Operation::invoke(2 * i, p, "write", i as i64));
            ops.push(Operation::ok(2 * i + 1, p, "write", i as i64));
        }
        History::new(ops).unwrap()
    }

    #[test]
    fn processes_sort_with_nemesis_last() {
        let ops = vec![
            Operation::invoke(0, Process::Nemesis, "start", Value::Nil),
            Operation::invoke(1, 7u64, "read", Value::Nil),
            Operation::invoke(2, 3u64, "read", Value::Nil),
            Operation::invoke(3, 7u64, "read", Value::Nil),
        ];
        let coords = process_coordinates(&ops);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords.track(&Process::Client(3)), Some(0));
        assert_eq!(coords.track(&Process::Client(7)), Some(1));
        assert_eq!(coords.track(&Process::Nemesis), Some(2));
    }

    #[test]
    fn declared_order_is_kept() {
        let ops = vec![Operation::invoke(0, 1u64, "read", Value::Nil)];
        let coords =
            process_coordinates_declared([Process::Client(1), Process::Client(0)], &ops).unwrap();
        assert_eq!(coords.track(&Process::Client(1)), Some(0));
        assert_eq!(coords.track(&Process::Client(0)), Some(1));
    }

    #[test]
    fn undeclared_process_is_a_configuration_error() {
        let ops = vec![Operation::invoke(4, 9u64, "read", Value::Nil)];
        let err = process_coordinates_declared([Process::Client(0)], &ops).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownProcess {
                process: Process::Client(9),
                index: 4
            }
        );
    }

    #[test]
    fn duplicate_declaration_is_a_configuration_error() {
        let err = process_coordinates_declared([Process::Nemesis, Process::Nemesis], std::iter::empty())
                .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateProcess(Process::Nemesis));
    }

    #[test]
    fn bounds_follow_previous_ok_and_final_op() {
        let history = sequential(4);
        let pairs = PairIndex::new(&history).unwrap();
        let analysis: Analysis<Register> = Analysis::new(history.get(6).unwrap().clone())
            .previous_ok(history.get(3).unwrap().clone());
        // previous_ok's invocation is 2; final op completes at 7.
        assert_eq!(
            time_bounds(&pairs, &analysis).unwrap(),
            TimeBounds { lower: 1, upper: 8 }
        );
    }

    #[test]
    fn bounds_without_previous_ok_start_at_zero() {
        let history = sequential(2);
        let pairs = PairIndex::new(&history).unwrap();
        let analysis: Analysis<Register> = Analysis::new(history.get(2).unwrap().clone());
        assert_eq!(
            time_bounds(&pairs, &analysis).unwrap(),
            TimeBounds { lower: 0, upper: 4 }
        );
    }

    #[test]
    fn bounds_reject_foreign_final_op() {
        let history = sequential(1);
        let pairs = PairIndex::new(&history).unwrap();
        let analysis: Analysis<Register> =
            Analysis::new(Operation::invoke(40, 0u64, "read", Value::Nil));
        assert_eq!(
            time_bounds(&pairs, &analysis),
            Err(ConfigurationError::UnknownOperation { index: 40 })
        );
    }

    #[test]
    fn condense_removes_gaps() {
        let coords = condense([
            (0, TimeSpan::new(0, 100)),
            (5, TimeSpan::new(40, 1_000)),
            (9, TimeSpan::new(100, 100)),
        ]);
        assert_eq!(coords.ranks(), 4);
        assert_eq!(coords.span(0), Some(TimeSpan::new(0, 2)));
        assert_eq!(coords.span(5), Some(TimeSpan::new(1, 3)));
        assert_eq!(coords.span(9), Some(TimeSpan::new(2, 2)));
    }

    #[test]
    fn time_coordinates_clamp_to_window() {
        // p0 invokes at 0 and completes at 9, past the window.
        let history = History::new(vec![
            Operation::invoke(0, 0u64, "write", 1i64),
            Operation::invoke(1, 1u64, "read", Value::Nil),
            Operation::ok(2, 1u64, "read", 1i64),
            Operation::invoke(3, 2u64, "read", Value::Nil),
            Operation::ok(4, 2u64, "read", 1i64),
            Operation::invoke(5, 3u64, "read", Value::Nil),
            Operation::ok(6, 3u64, "read", Value::Nil),
            Operation::invoke(7, 4u64, "read", Value::Nil),
            Operation::ok(8, 4u64, "read", Value::Nil),
            Operation::ok(9, 0u64, "write", 1i64),
        ])
        .unwrap();
        let pairs = PairIndex::new(&history).unwrap();
        let bounds = TimeBounds { lower: 1, upper: 5 };
        let ops = [history.get(0).unwrap(), history.get(1).unwrap(), history.get(3).unwrap()];
        let coords = time_coordinates(&pairs, bounds, ops).unwrap();
        // Raw spans relative to lower: write [0, 4], read@1 [0, 1], read@3 [2, 3].
        assert_eq!(coords.span(0), Some(TimeSpan::new(0, 4)));
        assert_eq!(coords.span(1), Some(TimeSpan::new(0, 1)));
        assert_eq!(coords.span(3), Some(TimeSpan::new(2, 3)));
        assert_eq!(coords.ranks(), 5);
    }

    #[test]
    fn completion_op_maps_to_invocation_key() {
        let history = sequential(1);
        let pairs = PairIndex::new(&history).unwrap();
        let bounds = TimeBounds { lower: 0, upper: 2 };
        let coords = time_coordinates(&pairs, bounds, [history.get(1).unwrap()]).unwrap();
        assert_eq!(coords.span(0), Some(TimeSpan::new(0, 1)));
        assert_eq!(coords.span(1), None);
    }
}
