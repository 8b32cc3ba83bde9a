//! Grid alignment helpers
//!
//! Every generator works in whole grid columns. Range bounds coming from the
//! window are quantized outward before use: the start rounds down and the end
//! rounds up to the next multiple of the grid unit.

/// Round `value` down to a multiple of `unit` (works for negative values)
pub fn floor_to_grid(value: i32, unit: i32) -> i32 {
    value.div_euclid(unit) * unit
}

/// Round `value` up to a multiple of `unit` (works for negative values)
pub fn ceil_to_grid(value: i32, unit: i32) -> i32 {
    let floored = floor_to_grid(value, unit);
    if floored == value {
        value
    } else {
        floored + unit
    }
}

/// Round a float coordinate down to a multiple of `unit`
pub fn floor_to_grid_f32(value: f32, unit: i32) -> f32 {
    (value / unit as f32).floor() * unit as f32
}

/// Half-open world-x range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRange {
    pub start: i32,
    pub end: i32,
}

impl ColumnRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Widen the range outward to grid alignment
    pub fn quantized(self, unit: i32) -> Self {
        Self {
            start: floor_to_grid(self.start, unit),
            end: ceil_to_grid(self.end, unit),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn width(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    pub fn contains(&self, x: i32) -> bool {
        x >= self.start && x < self.end
    }

    /// Grid columns covered by the quantized range, left to right
    pub fn columns(self, unit: i32) -> impl Iterator<Item = i32> {
        let range = self.quantized(unit);
        (range.start..range.end).step_by(unit as usize)
    }
}

impl std::fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
