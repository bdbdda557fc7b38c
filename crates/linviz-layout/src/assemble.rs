#![forbid(unsafe_code)]

//! End-to-end layout of an analysis.
//!
//! Runs the pipeline in order: coordinate assignment, path annotation, line
//! placement, line deduplication. Each stage consumes the complete output
//! of the previous one. The result is the only artifact a rendering
//! backend needs.

use std::collections::BTreeMap;

use linviz_core::{Analysis, History, LayoutRect, Model, OpType, Operation, PairIndex, Process};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::annotate::annotate_paths;
use crate::config::LayoutConfig;
use crate::coords::{
    ProcessCoords, TimeBounds, TimeCoords, TimeSpan, process_coordinates, time_bounds,
    time_coordinates,
};
use crate::dedup::{DedupReport, deduplicate};
use crate::error::{ConfigurationError, LayoutError};
use crate::placer::{GridPoint, Line, LineId, LinePlacer, PlacedTransition};
use crate::scale::LayoutScale;

/// An operation drawn as a `[t1, t2] × track` box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationBar {
    /// Index of the operation's invocation.
    pub invocation: usize,
    pub process: Process,
    pub track: usize,
    pub span: TimeSpan,
    pub label: String,
    /// Outcome from the completion; `Invoke` if it never completed.
    pub outcome: OpType,
}

impl OperationBar {
    /// Surface rectangle of this bar.
    #[must_use]
    pub fn rect(&self, scale: &LayoutScale) -> LayoutRect {
        scale.bar(self.span.start, self.span.end, self.track)
    }
}

/// A distinct model state at the point where it was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedModel<M> {
    pub model: M,
    pub point: GridPoint,
}

/// Complete layout of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult<M> {
    pub history: History,
    pub pair_index: PairIndex,
    /// Operations involved, one per invocation, in index order.
    pub ops: Vec<Operation>,
    pub bars: Vec<OperationBar>,
    /// Distinct models with the points they were placed at.
    pub models: Vec<PlacedModel<M>>,
    pub process_coords: ProcessCoords,
    pub time_coords: TimeCoords,
    pub bounds: TimeBounds,
    /// Annotated, placed, and deduplicated paths.
    pub paths: Vec<Vec<PlacedTransition<M>>>,
    /// Surviving lines keyed by id.
    pub lines: BTreeMap<LineId, Line<M>>,
    pub scale: LayoutScale,
    pub dedup: DedupReport,
}

impl<M: Model> LayoutResult<M> {
    /// Line referenced by a transition, if any.
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&Line<M>> {
        self.lines.get(&id)
    }

    /// Logical width in condensed time units.
    #[must_use]
    pub fn width(&self) -> usize {
        self.time_coords.ranks().saturating_sub(1)
    }

    /// Surface bounding box of all bars.
    #[must_use]
    pub fn bounding_box(&self) -> LayoutRect {
        self.bars
            .iter()
            .map(|b| b.rect(&self.scale))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

/// Lay out `analysis` over `history`.
pub fn layout<M: Model>(
    history: History,
    analysis: &Analysis<M>,
    config: &LayoutConfig,
) -> Result<LayoutResult<M>, LayoutError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "layout",
        ops = history.len(),
        paths = analysis.final_paths.len(),
        transitions = analysis.transition_count()
    )
    .entered();

    config
        .validate()
        .map_err(ConfigurationError::InvalidConfig)?;
    let pair_index = PairIndex::new(&history)?;

    let involved = analysis
        .final_paths
        .iter()
        .flatten()
        .map(|t| &t.op)
        .chain(std::iter::once(&analysis.op))
        .chain(analysis.previous_ok.iter());
    for op in involved {
        if !history.contains(op) {
            return Err(ConfigurationError::UnknownOperation { index: op.index }.into());
        }
    }

    let ops = distinct_ops(&pair_index, analysis)?;
    let process_coords = process_coordinates(&ops);
    let bounds = time_bounds(&pair_index, analysis)?;
    let time_coords = time_coordinates(&pair_index, bounds, &ops)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        processes = process_coords.len(),
        ranks = time_coords.ranks(),
        lower = bounds.lower,
        upper = bounds.upper,
        "coordinates assigned"
    );

    let annotated = annotate_paths(
        &pair_index,
        &process_coords,
        &time_coords,
        &analysis.final_paths,
    )?;

    let mut placer = LinePlacer::new(config.step_divisions);
    let mut paths = placer.place_paths(&annotated)?;
    let (mut lines, _grid) = placer.finish();

    let dedup = deduplicate(&mut lines, &mut paths)?;

    let bars = ops
        .iter()
        .map(|op| operation_bar(&history, &pair_index, &process_coords, &time_coords, op))
        .collect::<Result<Vec<_>, _>>()?;
    let models = placed_models(&paths);

    Ok(LayoutResult {
        history,
        pair_index,
        ops,
        bars,
        models,
        process_coords,
        time_coords,
        bounds,
        paths,
        lines,
        scale: LayoutScale::from_config(config),
        dedup,
    })
}

/// Every operation on a path plus the final operation, one per invocation.
fn distinct_ops<M: Model>(
    pair_index: &PairIndex,
    analysis: &Analysis<M>,
) -> Result<Vec<Operation>, ConfigurationError> {
    let mut by_invocation: BTreeMap<usize, Operation> = BTreeMap::new();
    let all = analysis
        .final_paths
        .iter()
        .flatten()
        .map(|t| &t.op)
        .chain(std::iter::once(&analysis.op));
    for op in all {
        let inv = pair_index
            .invocation(op)
            .ok_or(ConfigurationError::UnknownOperation { index: op.index })?;
        by_invocation.entry(inv).or_insert_with(|| op.clone());
    }
    Ok(by_invocation.into_values().collect())
}

fn operation_bar(
    history: &History,
    pair_index: &PairIndex,
    processes: &ProcessCoords,
    times: &TimeCoords,
    op: &Operation,
) -> Result<OperationBar, ConfigurationError> {
    let index = op.index;
    let invocation = pair_index
        .invocation(op)
        .ok_or(ConfigurationError::UnknownOperation { index })?;
    let track = processes
        .track(&op.process)
        .ok_or_else(|| ConfigurationError::UnknownProcess {
            process: op.process.clone(),
            index,
        })?;
    let span = times
        .span(invocation)
        .ok_or(ConfigurationError::MissingCoordinates { index })?;
    let outcome = pair_index
        .completion(op)
        .and_then(|c| history.get(c))
        .map_or(OpType::Invoke, |c| c.op_type);
    Ok(OperationBar {
        invocation,
        process: op.process.clone(),
        track,
        span,
        label: op.label(),
        outcome,
    })
}

fn placed_models<M: Model>(paths: &[Vec<PlacedTransition<M>>]) -> Vec<PlacedModel<M>> {
    let mut seen: FxHashSet<(GridPoint, &M)> = FxHashSet::default();
    let mut models = Vec::new();
    for t in paths.iter().flatten() {
        if seen.insert((t.point, t.model())) {
            models.push(PlacedModel {
                model: t.model().clone(),
                point: t.point,
            });
        }
    }
    models
}
