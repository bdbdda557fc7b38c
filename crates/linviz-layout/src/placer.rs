#![forbid(unsafe_code)]

//! Line placement: concrete horizontal positions for every transition.
//!
//! Paths are walked left to right. Each transition is placed at the first
//! point within its time bound that is not already held by a *different*
//! state on the same track. A state is a model together with whether it
//! rejected the operation, so a consistent and an inconsistent copy of the
//! same model never share a point. Points held by an equal state are reused,
//! which is what lets identical sub-transitions of different paths coincide
//! and be merged later. The placement grid is shared across all paths of a
//! render.
//!
//! Horizontal positions are fixed-point: one condensed time unit is
//! `step_divisions` ticks, and one placement step is one tick. Grid points
//! are therefore exact and hashable.
//!
//! # Invariants
//!
//! 1. **Bounded**: every accepted tick lies in
//!    `[min_x * step_divisions, max_x * step_divisions]`, or placement fails
//!    with [`LayoutOverflowError`].
//!
//! 2. **Unambiguous**: the grid never holds two different states at one
//!    point.
//!
//! 3. **Monotone**: within a path, each placement is strictly right of the
//!    previous one.

use std::collections::BTreeMap;
use std::fmt;

use linviz_core::{LayoutPoint, Model};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::annotate::AnnotatedTransition;
use crate::error::LayoutOverflowError;
use crate::scale::LayoutScale;

/// Stable identifier of a placed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point of the placement grid: a tick on a process track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GridPoint {
    pub tick: i64,
    pub track: usize,
}

impl GridPoint {
    #[inline]
    #[must_use]
    pub const fn new(tick: i64, track: usize) -> Self {
        Self { tick, track }
    }
}

/// A directed segment between two placements, labelled with the model
/// reached at its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line<M> {
    pub id: LineId,
    pub from: GridPoint,
    pub to: GridPoint,
    pub model: M,
    /// The end transition's model rejected its operation.
    pub rejected: bool,
}

impl<M> Line<M> {
    /// Surface endpoints of this line.
    #[must_use]
    pub fn segment(&self, scale: &LayoutScale) -> (LayoutPoint, LayoutPoint) {
        (scale.point(self.from), scale.point(self.to))
    }
}

/// A transition with its final placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedTransition<M> {
    pub annotated: AnnotatedTransition<M>,
    pub point: GridPoint,
    /// Incoming line; `None` for the first transition of a path.
    pub line: Option<LineId>,
}

impl<M> PlacedTransition<M> {
    #[inline]
    #[must_use]
    pub fn model(&self) -> &M {
        &self.annotated.transition.model
    }
}

/// Sparse map from grid point to the state occupying it: a model and its
/// rejected flag.
#[derive(Debug, Clone)]
pub struct PlacementGrid<M> {
    cells: FxHashMap<GridPoint, (M, bool)>,
}

impl<M> Default for PlacementGrid<M> {
    fn default() -> Self {
        Self {
            cells: FxHashMap::default(),
        }
    }
}

impl<M: Model> PlacementGrid<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State at `point`, if any.
    #[inline]
    #[must_use]
    pub fn probe(&self, point: GridPoint) -> Option<(&M, bool)> {
        self.cells.get(&point).map(|(m, rejected)| (m, *rejected))
    }

    /// Whether `point` is vacant or already holds exactly this state.
    #[inline]
    #[must_use]
    pub fn admits(&self, point: GridPoint, model: &M, rejected: bool) -> bool {
        self.probe(point)
            .is_none_or(|(m, r)| m == model && r == rejected)
    }

    /// Record `model` with its `rejected` flag at `point`.
    ///
    /// Returns `false`, leaving the grid unchanged, if a different state
    /// already holds the point.
    pub fn claim(&mut self, point: GridPoint, model: &M, rejected: bool) -> bool {
        match self.cells.get(&point) {
            Some((m, r)) => m == model && *r == rejected,
            None => {
                self.cells.insert(point, (model.clone(), rejected));
                true
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, &M, bool)> + '_ {
        self.cells.iter().map(|(&p, (m, r))| (p, m, *r))
    }
}

/// Places paths one at a time against a shared grid.
#[derive(Debug, Clone)]
pub struct LinePlacer<M> {
    grid: PlacementGrid<M>,
    lines: BTreeMap<LineId, Line<M>>,
    next_id: u64,
    step_divisions: u32,
}

impl<M: Model> LinePlacer<M> {
    /// A placer with `step_divisions` probes per time unit (at least 1).
    #[must_use]
    pub fn new(step_divisions: u32) -> Self {
        Self {
            grid: PlacementGrid::new(),
            lines: BTreeMap::new(),
            next_id: 0,
            step_divisions: step_divisions.max(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn grid(&self) -> &PlacementGrid<M> {
        &self.grid
    }

    #[inline]
    #[must_use]
    pub fn lines(&self) -> &BTreeMap<LineId, Line<M>> {
        &self.lines
    }

    /// Place every transition of `path`, emitting one line per transition
    /// after the first.
    pub fn place_path(
        &mut self,
        path: &[AnnotatedTransition<M>],
    ) -> Result<Vec<PlacedTransition<M>>, LayoutOverflowError> {
        let div = i64::from(self.step_divisions);
        let mut prior: Option<GridPoint> = None;
        let mut placed = Vec::with_capacity(path.len());

        for t in path {
            let model = &t.transition.model;
            let rejected = t.transition.rejected;
            let min_tick = t.min_x() * div;
            let max_tick = t.max_x() * div;
            let mut tick = match prior {
                Some(p) => (p.tick + 1).max(min_tick),
                None => min_tick,
            };

            loop {
                if tick > max_tick {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        op = t.transition.op.index,
                        track = t.track,
                        min_tick,
                        max_tick,
                        candidate = tick,
                        "line placer: no room within bound"
                    );
                    return Err(LayoutOverflowError {
                        op_index: t.transition.op.index,
                        track: t.track,
                        min_tick,
                        max_tick,
                        candidate: tick,
                        step_divisions: self.step_divisions,
                    });
                }
                if self.grid.admits(GridPoint::new(tick, t.track), model, rejected) {
                    break;
                }
                tick += 1;
            }

            let point = GridPoint::new(tick, t.track);
            let claimed = self.grid.claim(point, model, rejected);
            debug_assert!(claimed, "accepted point held by another state");

            let line = prior.map(|from| {
                let id = LineId(self.next_id);
                self.next_id += 1;
                self.lines.insert(
                    id,
                    Line {
                        id,
                        from,
                        to: point,
                        model: model.clone(),
                        rejected,
                    },
                );
                id
            });

            placed.push(PlacedTransition {
                annotated: t.clone(),
                point,
                line,
            });
            prior = Some(point);
        }

        Ok(placed)
    }

    /// Place all paths in order.
    pub fn place_paths(
        &mut self,
        paths: &[Vec<AnnotatedTransition<M>>],
    ) -> Result<Vec<Vec<PlacedTransition<M>>>, LayoutOverflowError> {
        paths.iter().map(|path| self.place_path(path)).collect()
    }

    /// Consume the placer, returning the emitted lines and the grid.
    #[must_use]
    pub fn finish(self) -> (BTreeMap<LineId, Line<M>>, PlacementGrid<M>) {
        (self.lines, self.grid)
    }
}
