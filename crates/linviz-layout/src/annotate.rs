#![forbid(unsafe_code)]

//! Attach track and time bounds to every transition of a path.

use linviz_core::{Model, PairIndex, Path, Transition};
use serde::Serialize;

use crate::coords::{ProcessCoords, TimeCoords, TimeSpan};
use crate::error::ConfigurationError;

/// A transition with its vertical track and horizontal bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedTransition<M> {
    pub transition: Transition<M>,
    /// Process track (`y`).
    pub track: usize,
    /// Condensed bound: `min_x = bound.start`, `max_x = bound.end`.
    pub bound: TimeSpan,
}

impl<M> AnnotatedTransition<M> {
    #[inline]
    #[must_use]
    pub fn min_x(&self) -> i64 {
        self.bound.start
    }

    #[inline]
    #[must_use]
    pub fn max_x(&self) -> i64 {
        self.bound.end
    }
}

/// Annotate one path. Order and length are preserved.
pub fn annotate_path<M: Model>(
    pair_index: &PairIndex,
    processes: &ProcessCoords,
    times: &TimeCoords,
    path: &Path<M>,
) -> Result<Vec<AnnotatedTransition<M>>, ConfigurationError> {
    path.iter()
        .map(|t| {
            let index = t.op.index;
            let track = processes
                .track(&t.op.process)
                .ok_or_else(|| ConfigurationError::UnknownProcess {
                    process: t.op.process.clone(),
                    index,
                })?;
            let bound = pair_index
                .invocation(&t.op)
                .and_then(|inv| times.span(inv))
                .ok_or(ConfigurationError::MissingCoordinates { index })?;
            Ok(AnnotatedTransition {
                transition: t.clone(),
                track,
                bound,
            })
        })
        .collect()
}

/// Annotate every path of an analysis.
pub fn annotate_paths<M: Model>(
    pair_index: &PairIndex,
    processes: &ProcessCoords,
    times: &TimeCoords,
    paths: &[Path<M>],
) -> Result<Vec<Vec<AnnotatedTransition<M>>>, ConfigurationError> {
    paths
        .iter()
        .map(|path| annotate_path(pair_index, processes, times, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{TimeBounds, process_coordinates, time_coordinates};
    use linviz_core::{History, Operation, Register, Value};

    fn history() -> History {
        History::new(vec![
            Operation::invoke(0, 0u64, "write", 1i64),
            Operation::invoke(1, 1u64, "read", Value::Nil),
            Operation::ok(2, 0u64, "write", 1i64),
            Operation::ok(3, 1u64, "read", 1i64),
        ])
        .unwrap()
    }

    #[test]
    fn annotation_preserves_order_and_resolves_completions() {
        let history = history();
        let pairs = PairIndex::new(&history).unwrap();
        let processes = process_coordinates(history.iter());
        let times = time_coordinates(
            &pairs,
            TimeBounds { lower: 0, upper: 4 },
            [history.get(0).unwrap(), history.get(1).unwrap()],
        )
        .unwrap();

        // The read is referenced by its completion; the write by its invocation.
        let path = vec![
            Transition::new(history.get(0).unwrap().clone(), Register::new(1i64)),
            Transition::new(history.get(3).unwrap().clone(), Register::new(1i64)),
        ];
        let annotated = annotate_path(&pairs, &processes, &times, &path).unwrap();

        assert_eq!(annotated.len(), 2);
        assert_eq!(annotated[0].transition.op.index, 0);
        assert_eq!(annotated[0].track, 0);
        assert_eq!((annotated[0].min_x(), annotated[0].max_x()), (0, 2));
        assert_eq!(annotated[1].transition.op.index, 3);
        assert_eq!(annotated[1].track, 1);
        assert_eq!((annotated[1].min_x(), annotated[1].max_x()), (1, 3));
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let history = history();
        let pairs = PairIndex::new(&history).unwrap();
        let processes = process_coordinates(history.iter());
        let times = TimeCoords::default();
        let path = vec![Transition::new(
            history.get(1).unwrap().clone(),
            Register::empty(),
        )];
        assert_eq!(
            annotate_path(&pairs, &processes, &times, &path),
            Err(ConfigurationError::MissingCoordinates { index: 1 })
        );
    }
}
