#![forbid(unsafe_code)]

//! Scaling contract between the layout and a rendering backend.
//!
//! Logical coordinates are condensed time units horizontally and track
//! indices vertically. A backend multiplies them by fixed factors to get
//! drawing-surface units. An operation bar on track `t` covers
//! `[t, t + bar_height]` vertically; lines meet bars at their centre line.

use linviz_core::{LayoutPoint, LayoutRect};
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::placer::GridPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutScale {
    /// Surface units per condensed time unit.
    pub x: f64,
    /// Surface units per track.
    pub y: f64,
    /// Ticks per condensed time unit.
    pub step_divisions: u32,
    /// Bar height as a fraction of a track.
    pub bar_height: f64,
}

impl LayoutScale {
    #[must_use]
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            x: config.x_scale,
            y: config.y_scale,
            step_divisions: config.step_divisions.max(1),
            bar_height: config.bar_height,
        }
    }

    /// Logical x of a tick, in condensed time units.
    #[inline]
    #[must_use]
    pub fn logical_x(&self, tick: i64) -> f64 {
        tick as f64 / f64::from(self.step_divisions)
    }

    /// Logical y of a track's centre line.
    #[inline]
    #[must_use]
    pub fn track_center(&self, track: usize) -> f64 {
        track as f64 + self.bar_height / 2.0
    }

    /// Surface position of a grid point.
    #[must_use]
    pub fn point(&self, p: GridPoint) -> LayoutPoint {
        LayoutPoint::new(
            self.logical_x(p.tick) * self.x,
            self.track_center(p.track) * self.y,
        )
    }

    /// Surface rectangle of a `[start, end]` span on `track`.
    #[must_use]
    pub fn bar(&self, start: i64, end: i64, track: usize) -> LayoutRect {
        LayoutRect::new(
            start as f64 * self.x,
            track as f64 * self.y,
            (end - start) as f64 * self.x,
            self.bar_height * self.y,
        )
    }
}

impl Default for LayoutScale {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
