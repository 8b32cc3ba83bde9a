use super::grid::ColumnRange;
use super::spatial_index::SpatialIndex;
use crate::entity::Layer;
use crate::host::Host;

/// A generator the stream window can drive over column ranges
///
/// `create_in_range` does not check what already exists: callers must hand
/// out disjoint ranges, or content is spawned twice. Both operations quantize
/// the range outward to the grid before use.
pub trait RangeGenerator {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Host layers this generator spawns into, in removal order
    fn layers(&self) -> &[Layer];

    /// Spawn and index the content of every column in `range`
    fn create_in_range(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex);

    /// Remove this generator's content from every column in `range`
    fn delete(&mut self, range: ColumnRange, host: &mut dyn Host, index: &mut SpatialIndex);
}
