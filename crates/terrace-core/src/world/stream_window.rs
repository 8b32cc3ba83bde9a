//! Sliding stream window
//!
//! Tracks the materialized range `[start, end)` around the viewport. The
//! window is wider than the viewport by `margin_units` grid units on each side
//! and moves by exactly one grid unit per qualifying step, so the generation
//! cost of a tick is bounded by one column no matter how fast the viewport
//! moves. A viewport that outruns the tick rate is caught up over several
//! ticks; this is a soft real-time assumption, not a guarantee.

use super::grid::{ColumnRange, ceil_to_grid, floor_to_grid};
use super::worldgen_config::StreamParams;
use crate::host::Viewport;

/// Outcome of one [`StreamWindow::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    Idle,
    /// Strip to create at the right edge and trailing strip to evict at the left
    ShiftRight { create: ColumnRange, evict: ColumnRange },
    /// Strip to create at the left edge and trailing strip to evict at the right
    ShiftLeft { create: ColumnRange, evict: ColumnRange },
}

impl WindowStep {
    pub fn is_shift(&self) -> bool {
        !matches!(self, WindowStep::Idle)
    }

    /// `(create, evict)` strips of a shift
    pub fn strips(&self) -> Option<(ColumnRange, ColumnRange)> {
        match *self {
            WindowStep::Idle => None,
            WindowStep::ShiftRight { create, evict } | WindowStep::ShiftLeft { create, evict } => {
                Some((create, evict))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamWindow {
    start: i32,
    end: i32,
    unit: i32,
    eviction_units: i32,
}

impl StreamWindow {
    /// Window centred on `center_x`, spanning the viewport plus the margins
    pub fn new(
        center_x: f32,
        viewport_width: f32,
        unit: i32,
        margin_units: i32,
        eviction_units: i32,
    ) -> Self {
        let span = ceil_to_grid(viewport_width.ceil() as i32, unit) + 2 * margin_units * unit;
        let start = floor_to_grid((center_x - span as f32 / 2.0).floor() as i32, unit);
        Self {
            start,
            end: start + span,
            unit,
            eviction_units,
        }
    }

    pub fn from_viewport(viewport: Viewport, unit: i32, params: &StreamParams) -> Self {
        Self::new(
            viewport.center_x,
            viewport.width(),
            unit,
            params.margin_units,
            params.eviction_units,
        )
    }

    pub fn range(&self) -> ColumnRange {
        ColumnRange::new(self.start, self.end)
    }

    pub fn span(&self) -> i32 {
        self.end - self.start
    }

    /// Advance at most one grid unit toward `center_x`
    ///
    /// Shifts right once the span centred on `center_x` pokes more than one
    /// unit past `end`, and left symmetrically; otherwise stays idle.
    pub fn step(&mut self, center_x: f32) -> WindowStep {
        let half = self.span() as f32 / 2.0;
        let unit = self.unit;
        let eviction = self.eviction_units * unit;

        if center_x + half > (self.end + unit) as f32 {
            let step = WindowStep::ShiftRight {
                create: ColumnRange::new(self.end, self.end + unit),
                evict: ColumnRange::new(self.start - eviction, self.start),
            };
            self.start += unit;
            self.end += unit;
            step
        } else if center_x - half < (self.start - unit) as f32 {
            let step = WindowStep::ShiftLeft {
                create: ColumnRange::new(self.start - unit, self.start),
                evict: ColumnRange::new(self.end, self.end + eviction),
            };
            self.start -= unit;
            self.end -= unit;
            step
        } else {
            WindowStep::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(center: f32) -> StreamWindow {
        StreamWindow::new(center, 600.0, 30, 5, 3)
    }

    #[test]
    fn test_initial_range_covers_viewport_and_margins() {
        let w = window(0.0);
        assert_eq!(w.span(), 600 + 2 * 5 * 30);
        assert_eq!(w.range(), ColumnRange::new(-450, 450));

        // Odd viewport widths round up to the grid
        let w = StreamWindow::new(15.0, 601.0, 30, 5, 3);
        assert_eq!(w.span(), 630 + 300);
        assert_eq!(w.range().start.rem_euclid(30), 0);
    }

    #[test]
    fn test_idle_within_hysteresis() {
        let mut w = window(0.0);
        assert_eq!(w.step(0.0), WindowStep::Idle);
        assert_eq!(w.step(30.0), WindowStep::Idle);
        assert_eq!(w.step(-30.0), WindowStep::Idle);
    }

    #[test]
    fn test_shift_right_strips() {
        let mut w = window(0.0);
        let step = w.step(31.0);
        assert_eq!(
            step,
            WindowStep::ShiftRight {
                create: ColumnRange::new(450, 480),
                evict: ColumnRange::new(-540, -450),
            }
        );
        assert_eq!(w.range(), ColumnRange::new(-420, 480));
    }

    #[test]
    fn test_shift_left_strips() {
        let mut w = window(0.0);
        let step = w.step(-31.0);
        assert_eq!(
            step,
            WindowStep::ShiftLeft {
                create: ColumnRange::new(-480, -450),
                evict: ColumnRange::new(450, 540),
            }
        );
        assert_eq!(w.range(), ColumnRange::new(-480, 420));
    }

    #[test]
    fn test_at_most_one_unit_per_step() {
        let mut w = window(0.0);
        let before = w.range();
        let step = w.step(10_000.0);
        assert!(step.is_shift());
        assert_eq!(w.range().start - before.start, 30);

        // Catches up one unit at a time
        let mut shifts = 1;
        while w.step(10_000.0).is_shift() {
            shifts += 1;
        }
        // Stops once the centred span is within one unit of `end`
        assert_eq!(shifts, 333);
    }

    #[test]
    fn test_shift_latency_bound() {
        let unit = 30.0_f32;
        for (speed, dt) in [(8.0_f32, 0.5_f32), (64.0, 0.25), (120.0, 0.125)] {
            let mut w = window(0.0);
            let bound = (unit / (speed * dt)).ceil() as u32;
            let mut center = 0.0_f32;
            let mut since_last = 0u32;
            let mut shifts = 0;
            for _ in 0..2000 {
                center += speed * dt;
                since_last += 1;
                if w.step(center).is_shift() {
                    if shifts > 0 {
                        assert!(
                            since_last <= bound,
                            "speed {} took {} ticks (bound {})",
                            speed,
                            since_last,
                            bound
                        );
                    }
                    shifts += 1;
                    since_last = 0;
                }
            }
            assert!(shifts > 0);
        }
    }

    #[test]
    fn test_reversal_reissues_trailing_column() {
        // The window alone does not know what is live; a right shift followed
        // by a left shift creates a column that was never evicted
        let mut w = window(0.0);
        w.step(31.0);
        w.step(61.0);
        let left = w.step(-200.0);
        let Some((create, _)) = left.strips() else {
            panic!("expected a left shift");
        };
        assert_eq!(create, ColumnRange::new(-420, -390));
        assert_eq!(w.range(), ColumnRange::new(-420, 480));
    }
}
