//! Seeded 1D height noise

use fastnoise_lite::FastNoiseLite;

use super::grid::floor_to_grid_f32;
use super::worldgen_config::TerrainParams;

/// Deterministic ground-height field
///
/// Samples the configured noise at `x / unit` and snaps the result to the grid.
/// Holds no mutable state, so any number of callers may query it in any order.
pub struct NoiseField {
    noise: FastNoiseLite,
    base_height: f32,
    amplitude: f32,
    unit: i32,
}

impl NoiseField {
    pub fn new(seed: u64, params: &TerrainParams, unit: i32) -> Self {
        Self {
            noise: params.height_noise.to_fastnoise(seed),
            base_height: params.base_height,
            amplitude: params.amplitude,
            unit,
        }
    }

    /// Raw noise value in roughly `[-1, 1]` at world x
    pub fn sample(&self, x: f32) -> f32 {
        self.noise.get_noise_2d(x / self.unit as f32, 0.0)
    }

    /// Grid-aligned ground height at world x (screen y of the surface)
    pub fn ground_height_at(&self, x: f32) -> f32 {
        floor_to_grid_f32(self.base_height + self.amplitude * self.sample(x), self.unit)
    }

    /// Integer form of [`Self::ground_height_at`] for grid columns
    pub fn height_at(&self, x: i32) -> i32 {
        self.ground_height_at(x as f32) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::worldgen_config::TerrainParams;

    fn field(seed: u64) -> NoiseField {
        NoiseField::new(seed, &TerrainParams::default(), 30)
    }

    #[test]
    fn test_height_at_origin_is_base_height() {
        // Gradient noise vanishes at x = 0, leaving the grid-aligned base height
        assert_eq!(field(220).height_at(0), 450);
        assert_eq!(field(220).ground_height_at(0.0), 450.0);
    }

    #[test]
    fn test_same_seed_same_heights() {
        let a = field(220);
        let b = field(220);
        for column in (-3000..3000).step_by(30) {
            assert_eq!(a.height_at(column), b.height_at(column));
        }
    }

    #[test]
    fn test_heights_are_grid_aligned() {
        let f = field(7);
        for column in (-1500..1500).step_by(30) {
            assert_eq!(f.height_at(column).rem_euclid(30), 0);
        }
    }

    #[test]
    fn test_query_order_does_not_matter() {
        let f = field(99);
        let forward: Vec<i32> = (0..50).map(|i| f.height_at(i * 30)).collect();
        let mut backward: Vec<i32> = (0..50).rev().map(|i| f.height_at(i * 30)).collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_terrain_is_not_flat() {
        let f = field(220);
        let first = f.height_at(30);
        assert!(
            (1..200).any(|i| f.height_at(i * 30) != first),
            "terrain should vary over 200 columns"
        );
    }

    #[test]
    fn test_heights_stay_within_amplitude() {
        let f = field(3);
        for column in (-6000..6000).step_by(30) {
            let h = f.height_at(column);
            assert!((450 - 330..=450 + 330).contains(&h), "height {} out of band", h);
        }
    }
}
