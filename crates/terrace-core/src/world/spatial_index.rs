//! Column-keyed index of spawned entities
//!
//! One index is shared by every generator of a world. Each column key holds
//! its entities in creation order; a key may hold entities of several
//! generators at once (terrain, trunk and decoration at the same x).

use ahash::{AHashMap, AHashSet};

use super::grid::ColumnRange;
use crate::entity::{EntityHandle, Layer, PlacedEntity, SpawnRequest};
use crate::host::Host;

#[derive(Debug, Default)]
pub struct SpatialIndex {
    columns: AHashMap<i32, Vec<PlacedEntity>>,
    /// Reverse lookup used for collision dispatch and leaf revival
    handles: AHashMap<EntityHandle, i32>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity to `column`'s list, creating the list if absent
    pub fn register(&mut self, column: i32, mut entity: PlacedEntity) {
        entity.column = column;
        self.handles.insert(entity.handle, column);
        self.columns.entry(column).or_default().push(entity);
    }

    /// Remove every entity of the columns in `range` that lives in one of `candidate_layers`
    ///
    /// Each entity is offered to the candidate layers in order and the first
    /// successful removal wins. Entities that belong to other layers are left
    /// alone and stay indexed. Returns the number of host removals.
    pub fn delete_range(
        &mut self,
        range: ColumnRange,
        unit: i32,
        candidate_layers: &[Layer],
        host: &mut dyn Host,
    ) -> usize {
        let mut removed = 0;
        for column in range.columns(unit) {
            let Some(entities) = self.columns.get_mut(&column) else {
                continue;
            };

            let handles = &mut self.handles;
            entities.retain(|entity| {
                let gone = candidate_layers
                    .iter()
                    .any(|layer| host.remove(entity.handle, *layer));
                if gone {
                    removed += 1;
                }
                // The host may have dropped the entity already; it is still ours to forget
                let owned = gone || candidate_layers.contains(&entity.layer);
                if owned {
                    handles.remove(&entity.handle);
                }
                !owned
            });

            if entities.is_empty() {
                self.columns.remove(&column);
            }
        }
        removed
    }

    pub fn entities_at(&self, column: i32) -> &[PlacedEntity] {
        self.columns.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn column_of(&self, handle: EntityHandle) -> Option<i32> {
        self.handles.get(&handle).copied()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&PlacedEntity> {
        let column = self.column_of(handle)?;
        self.columns
            .get(&column)?
            .iter()
            .find(|e| e.handle == handle)
    }

    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut PlacedEntity> {
        let column = self.column_of(handle)?;
        self.columns
            .get_mut(&column)?
            .iter_mut()
            .find(|e| e.handle == handle)
    }

    /// Point an indexed entity at a new host handle, keeping its slot and column
    pub fn rehandle(&mut self, old: EntityHandle, new: EntityHandle) -> bool {
        let Some(column) = self.handles.remove(&old) else {
            return false;
        };
        self.handles.insert(new, column);
        if let Some(entity) = self
            .columns
            .get_mut(&column)
            .and_then(|list| list.iter_mut().find(|e| e.handle == old))
        {
            entity.handle = new;
        }
        true
    }

    /// Every indexed entity, column order unspecified
    pub fn iter(&self) -> impl Iterator<Item = &PlacedEntity> {
        self.columns.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlacedEntity> {
        self.columns.values_mut().flatten()
    }

    /// Columns holding at least one entity
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn entity_count(&self) -> usize {
        self.handles.len()
    }

    /// Number of indexed entities whose column lies in `range`
    pub fn entity_count_in(&self, range: ColumnRange, unit: i32) -> usize {
        range
            .columns(unit)
            .map(|column| self.entities_at(column).len())
            .sum()
    }

    /// Entities that repeat an identical request under the same column key
    ///
    /// Non-zero only when a column was created twice without being deleted.
    pub fn duplicate_count(&self) -> usize {
        self.columns
            .values()
            .map(|entities| {
                let unique: AHashSet<&SpawnRequest> = entities.iter().map(|e| &e.request).collect();
                entities.len() - unique.len()
            })
            .sum()
    }
}
