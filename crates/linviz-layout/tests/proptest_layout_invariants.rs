//! Property-based invariant tests for the linviz-layout pipeline.
//!
//! These tests verify structural invariants that must hold for **any**
//! well-formed history and set of candidate paths:
//!
//! 1. Condensation preserves order and produces a contiguous image.
//! 2. Process coordinates are a bijection onto `0..n`.
//! 3. Every placement lies within its transition's bound.
//! 4. Placements within a path move strictly right.
//! 5. The grid never holds two different states at one point.
//! 6. Every referenced line survives deduplication and matches its endpoints
//!    and rejected flag.
//! 7. Surviving lines are pairwise distinct.
//! 8. Deduplication is idempotent.
//! 9. Layout is deterministic.
//! 10. Only placement can fail on a well-formed input.

use std::collections::BTreeSet;

use linviz_core::{Analysis, History, Operation, Process, Register, Transition, Value};
use linviz_layout::{
    GridPoint, LayoutConfig, LayoutError, LayoutResult, TimeSpan, condense, deduplicate,
    process_coordinates,
};
use proptest::prelude::*;
use proptest::sample::Index;
use rustc_hash::{FxHashMap, FxHashSet};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Build a history from a sequence of process picks: a pick invokes if the
/// process is idle and completes otherwise. Open invocations are completed
/// at the end, except the last one when `leave_open` is set.
fn history_from_picks(picks: &[u64], leave_open: bool) -> History {
    let mut ops = Vec::new();
    let mut open: FxHashMap<u64, i64> = FxHashMap::default();
    for (n, &p) in picks.iter().enumerate() {
        let index = ops.len();
        match open.remove(&p) {
            Some(v) => ops.push(Operation::ok(index, p, "write", v)),
            None => {
                open.insert(p, n as i64);
                ops.push(Operation::invoke(index, p, "write", n as i64));
            }
        }
    }
    let mut rest: Vec<_> = open.into_iter().collect();
    rest.sort_unstable();
    if leave_open {
        rest.pop();
    }
    for (p, v) in rest {
        let index = ops.len();
        ops.push(Operation::ok(index, p, "write", v));
    }
    History::new(ops).expect("indexed by construction")
}

fn history_strategy() -> impl Strategy<Value = History> {
    (proptest::collection::vec(0u64..5, 1..24), any::<bool>())
        .prop_map(|(picks, leave_open)| history_from_picks(&picks, leave_open))
}

type RawPaths = Vec<Vec<(Index, i64, bool)>>;

fn raw_paths_strategy() -> impl Strategy<Value = RawPaths> {
    proptest::collection::vec(
        proptest::collection::vec((any::<Index>(), 0i64..3, proptest::bool::weighted(0.2)), 1..6),
        1..6,
    )
}

fn build_analysis(
    history: &History,
    raw: &RawPaths,
    final_pick: Index,
    window: Option<Index>,
) -> Analysis<Register> {
    let ops = history.ops();
    let final_op = final_pick.get(ops).clone();
    let mut analysis = Analysis::new(final_op.clone());
    if let Some(w) = window {
        let prior = w.get(&ops[..=final_op.index]).clone();
        analysis = analysis.previous_ok(prior);
    }
    for path in raw {
        analysis = analysis.path(
            path.iter()
                .map(|(i, m, rejected)| {
                    let op = i.get(ops).clone();
                    if *rejected {
                        Transition::rejected(op, Register::new(*m))
                    } else {
                        Transition::new(op, Register::new(*m))
                    }
                })
                .collect(),
        );
    }
    analysis
}

fn layout_case() -> impl Strategy<Value = (History, Analysis<Register>, u32)> {
    (
        history_strategy(),
        raw_paths_strategy(),
        any::<Index>(),
        proptest::option::of(any::<Index>()),
        1u32..8,
    )
        .prop_map(|(history, raw, final_pick, window, div)| {
            let analysis = build_analysis(&history, &raw, final_pick, window);
            (history, analysis, div)
        })
}

fn config(step_divisions: u32) -> LayoutConfig {
    LayoutConfig {
        step_divisions,
        ..LayoutConfig::default()
    }
}

fn run(
    history: &History,
    analysis: &Analysis<Register>,
    div: u32,
) -> Result<LayoutResult<Register>, LayoutError> {
    linviz_layout::layout(history.clone(), analysis, &config(div))
}

fn span_strategy() -> impl Strategy<Value = TimeSpan> {
    (-50i64..50, 0i64..40).prop_map(|(start, len)| TimeSpan::new(start, start + len))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Condensation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn condensation_preserves_order(spans in proptest::collection::vec(span_strategy(), 1..20)) {
        let raw: Vec<_> = spans.iter().copied().enumerate().collect();
        let coords = condense(raw.clone());
        let mut pairs = Vec::new();
        for (key, s) in &raw {
            let c = coords.span(*key).expect("every key is condensed");
            pairs.push((s.start, c.start));
            pairs.push((s.end, c.end));
        }
        for &(ra, ca) in &pairs {
            for &(rb, cb) in &pairs {
                prop_assert_eq!(ra.cmp(&rb), ca.cmp(&cb), "raw {} {} condensed {} {}", ra, rb, ca, cb);
            }
        }
    }

    #[test]
    fn condensation_image_is_contiguous(spans in proptest::collection::vec(span_strategy(), 1..20)) {
        let coords = condense(spans.iter().copied().enumerate());
        let image: BTreeSet<i64> = coords.iter().flat_map(|(_, s)| [s.start, s.end]).collect();
        let expected: BTreeSet<i64> = (0..coords.ranks() as i64).collect();
        prop_assert_eq!(image, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Process coordinates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn process_tracks_are_a_bijection(history in history_strategy()) {
        let coords = process_coordinates(history.ops());
        let distinct: FxHashSet<&Process> = history.iter().map(|op| &op.process).collect();
        prop_assert_eq!(coords.len(), distinct.len());
        let tracks: BTreeSet<usize> = distinct
            .iter()
            .map(|p| coords.track(p).expect("every process has a track"))
            .collect();
        prop_assert_eq!(tracks, (0..distinct.len()).collect::<BTreeSet<_>>());
        for (track, p) in coords.processes().iter().enumerate() {
            prop_assert_eq!(coords.track(p), Some(track));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3-7. Placement and deduplication
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn only_placement_can_fail((history, analysis, div) in layout_case()) {
        match run(&history, &analysis, div) {
            Ok(_) | Err(LayoutError::Overflow(_)) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn placements_stay_within_bounds((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        let div = i64::from(div);
        for t in result.paths.iter().flatten() {
            let tick = t.point.tick;
            prop_assert!(tick >= t.annotated.min_x() * div);
            prop_assert!(tick <= t.annotated.max_x() * div);
            prop_assert_eq!(t.point.track, t.annotated.track);
        }
    }

    #[test]
    fn placements_move_right_within_a_path((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        for path in &result.paths {
            for pair in path.windows(2) {
                prop_assert!(pair[0].point.tick < pair[1].point.tick);
            }
        }
    }

    #[test]
    fn grid_points_hold_one_state((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        let mut seen: FxHashMap<GridPoint, (&Register, bool)> = FxHashMap::default();
        for t in result.paths.iter().flatten() {
            let state = (t.model(), t.annotated.transition.rejected);
            if let Some(prior) = seen.insert(t.point, state) {
                prop_assert_eq!(prior, state);
            }
        }
    }

    #[test]
    fn referenced_lines_survive_and_match((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        for path in &result.paths {
            prop_assert_eq!(path.first().and_then(|t| t.line), None);
            for pair in path.windows(2) {
                let id = pair[1].line.expect("every later transition has a line");
                let line = result.line(id).expect("referenced line survives");
                prop_assert_eq!(line.from, pair[0].point);
                prop_assert_eq!(line.to, pair[1].point);
                prop_assert_eq!(&line.model, pair[1].model());
                prop_assert_eq!(line.rejected, pair[1].annotated.transition.rejected);
            }
        }
    }

    #[test]
    fn surviving_lines_are_distinct((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        let keys: FxHashSet<_> = result
            .lines
            .values()
            .map(|l| (l.from, l.to, &l.model, l.rejected))
            .collect();
        prop_assert_eq!(keys.len(), result.lines.len());
        prop_assert_eq!(result.dedup.surviving, result.lines.len());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8-9. Idempotence and determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dedup_is_idempotent((history, analysis, div) in layout_case()) {
        let Ok(result) = run(&history, &analysis, div) else { return Ok(()); };
        let mut lines = result.lines.clone();
        let mut paths = result.paths.clone();
        let report = deduplicate(&mut lines, &mut paths).expect("acyclic");
        prop_assert_eq!(report.merged, 0);
        prop_assert_eq!(lines, result.lines);
        prop_assert_eq!(paths, result.paths);
    }

    #[test]
    fn layout_is_deterministic((history, analysis, div) in layout_case()) {
        let a = run(&history, &analysis, div);
        let b = run(&history, &analysis, div);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn nil_values_do_not_disturb_pairing() {
    let history = History::new(vec![
        Operation::invoke(0, 0u64, "read", Value::Nil),
        Operation::ok(1, 0u64, "read", Value::Nil),
    ])
    .expect("indexed");
    let analysis = Analysis::new(history.ops()[1].clone())
        .path(vec![Transition::new(history.ops()[1].clone(), Register::empty())]);
    let result = run(&history, &analysis, 6).expect("layout");
    assert_eq!(result.bars.len(), 1);
    assert_eq!(result.bars[0].span, TimeSpan::new(0, 1));
}
