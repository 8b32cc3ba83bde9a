//! Per-column seeded RNG
//!
//! Every generator reseeds from `(column, world_seed)` before touching a column,
//! so a column's content never depends on which columns were generated before
//! it. The draw order inside a column is part of the output: the placement roll
//! comes first, then the shape/height rolls.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// RNG state used for one column's generation
pub type ColumnRng = Xoshiro256StarStar;

/// Combine a column and the world seed into one RNG seed
///
/// Two-field hash `31 * (31 + column) + seed` with wrapping arithmetic.
pub fn column_seed(column: i32, world_seed: u64) -> u64 {
    31u64
        .wrapping_add(column as i64 as u64)
        .wrapping_mul(31)
        .wrapping_add(world_seed)
}

/// Fresh RNG for a column; replaying it reproduces that column exactly
pub fn column_rng(column: i32, world_seed: u64) -> ColumnRng {
    Xoshiro256StarStar::seed_from_u64(column_seed(column, world_seed))
}

/// RNG for a single cell (used by per-entity behaviors, never by column generation)
pub fn cell_rng(x: i32, y: i32, world_seed: u64) -> ColumnRng {
    let seed = column_seed(x, world_seed)
        .wrapping_mul(31)
        .wrapping_add(y as i64 as u64);
    Xoshiro256StarStar::seed_from_u64(seed)
}

/// Integer draws used by the generators
pub trait WorldRng {
    /// Uniform integer in `[0, bound)`; `bound` must be positive
    fn roll_below(&mut self, bound: i32) -> i32;

    /// Uniform integer in `[min, max]`
    fn roll_between(&mut self, min: i32, max: i32) -> i32;

    /// Uniform odd integer in `[min, max]` by rejection sampling
    ///
    /// The range must contain at least one odd value.
    fn roll_odd_between(&mut self, min: i32, max: i32) -> i32 {
        loop {
            let value = self.roll_between(min, max);
            if value.rem_euclid(2) == 1 {
                return value;
            }
        }
    }
}

impl<T: Rng> WorldRng for T {
    fn roll_below(&mut self, bound: i32) -> i32 {
        self.gen_range(0..bound)
    }

    fn roll_between(&mut self, min: i32, max: i32) -> i32 {
        self.gen_range(min..=max)
    }
}
