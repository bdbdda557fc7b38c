#![forbid(unsafe_code)]

//! Line deduplication across candidate paths.
//!
//! Lines with equal endpoints, equal models and an equal rejected flag are
//! the same drawable segment. The lowest-id line of each group survives; the rest are removed
//! and every transition pointing at them is retargeted to the survivor.
//!
//! # Invariants
//!
//! 1. **Closed**: after [`deduplicate`], every line id referenced by a
//!    transition is present in the surviving set.
//!
//! 2. **Idempotent**: deduplicating a deduplicated set merges nothing.
//!
//! 3. **Direct**: a resolved remap sends every removed id straight to a
//!    surviving id, never to another removed id.

use std::collections::BTreeMap;

use linviz_core::Model;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::ConfigurationError;
use crate::placer::{GridPoint, Line, LineId, PlacedTransition};

/// Table of removed line ids and the ids they were merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRemap {
    targets: BTreeMap<LineId, LineId>,
}

impl LineRemap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` was merged into `to`.
    pub fn insert(&mut self, from: LineId, to: LineId) {
        self.targets.insert(from, to);
    }

    /// Fold another remap table into this one.
    pub fn extend(&mut self, other: &LineRemap) {
        self.targets
            .extend(other.targets.iter().map(|(&k, &v)| (k, v)));
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Follow `id` through the table to its final target.
    pub fn resolve(&self, id: LineId) -> Result<LineId, ConfigurationError> {
        let mut current = id;
        let mut visited = FxHashSet::default();
        while let Some(&next) = self.targets.get(&current) {
            if !visited.insert(current) {
                return Err(ConfigurationError::RemapCycle { id: current });
            }
            current = next;
        }
        Ok(current)
    }

    /// Resolve every entry to a fixed point, so each removed id maps
    /// directly to its final target.
    pub fn resolved(&self) -> Result<LineRemap, ConfigurationError> {
        let mut resolved = BTreeMap::new();
        for &from in self.targets.keys() {
            resolved.insert(from, self.resolve(from)?);
        }
        Ok(LineRemap { targets: resolved })
    }

    /// Target of `id` in this table, or `id` itself.
    #[inline]
    #[must_use]
    pub fn get(&self, id: LineId) -> LineId {
        self.targets.get(&id).copied().unwrap_or(id)
    }
}

/// Outcome counts of a deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub merged: usize,
    pub surviving: usize,
}

/// Merge identical lines in place, returning the remap of removed ids.
pub fn dedup_lines<M: Model>(lines: &mut BTreeMap<LineId, Line<M>>) -> LineRemap {
    let mut remap = LineRemap::new();
    {
        let mut canonical: FxHashMap<(GridPoint, GridPoint, &M, bool), LineId> =
            FxHashMap::default();
        for (&id, line) in lines.iter() {
            let key = (line.from, line.to, &line.model, line.rejected);
            match canonical.get(&key) {
                Some(&keep) => remap.insert(id, keep),
                None => {
                    canonical.insert(key, id);
                }
            }
        }
    }
    for id in remap.targets.keys() {
        lines.remove(id);
    }
    remap
}

/// Rewrite every transition's line id through `remap`.
///
/// `remap` is resolved to a fixed point first.
pub fn apply_remap<M>(
    remap: &LineRemap,
    paths: &mut [Vec<PlacedTransition<M>>],
) -> Result<(), ConfigurationError> {
    let resolved = remap.resolved()?;
    for t in paths.iter_mut().flat_map(|p| p.iter_mut()) {
        if let Some(id) = t.line {
            t.line = Some(resolved.get(id));
        }
    }
    Ok(())
}

/// Deduplicate `lines` and retarget `paths` onto the survivors.
pub fn deduplicate<M: Model>(
    lines: &mut BTreeMap<LineId, Line<M>>,
    paths: &mut [Vec<PlacedTransition<M>>],
) -> Result<DedupReport, ConfigurationError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("dedup_lines", lines = lines.len()).entered();

    let remap = dedup_lines(lines);
    apply_remap(&remap, paths)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        merged = remap.len(),
        surviving = lines.len(),
        "line deduplicator: merged identical lines"
    );

    Ok(DedupReport {
        merged: remap.len(),
        surviving: lines.len(),
    })
}
