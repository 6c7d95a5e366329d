//! Map and chunk queries.
//!
//! A map is a root node whose first `width * height` children are chunks,
//! created once in x-outer / y-inner order. Actors are appended after the
//! chunks. Every query here is a linear scan over the map's children.

use codingland_logic::constants::{BUILDING_SLOT, TERRAIN_SLOT};
use codingland_logic::pathfinding::grid_dimensions;
use codingland_logic::Vector;
use hecs::Entity;

use crate::components::*;
use crate::error::StageError;
use crate::stage::Stage;

/// Read-only view of one map cell.
#[derive(Clone, Copy)]
pub struct ChunkRef<'a> {
    stage: &'a Stage,
    entity: Entity,
}

impl<'a> ChunkRef<'a> {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn position(&self) -> Vector {
        self.stage.position(self.entity).unwrap_or(Vector::NULL)
    }

    /// Live occupant of a slot.
    pub fn occupant(&self, slot: usize) -> Option<Entity> {
        self.stage
            .child_at(self.entity, slot)
            .filter(|e| self.stage.is_alive(*e))
    }

    pub fn terrain(&self) -> Option<TerrainKind> {
        self.occupant(TERRAIN_SLOT)
            .and_then(|e| self.stage.kind(e))
            .and_then(|k| k.terrain())
    }

    pub fn building(&self) -> Option<BuildingKind> {
        self.occupant(BUILDING_SLOT)
            .and_then(|e| self.stage.kind(e))
            .and_then(|k| k.building())
    }

    /// Passable unless the terrain occupant says otherwise.
    pub fn passable(&self) -> bool {
        match self.occupant(TERRAIN_SLOT) {
            Some(terrain) => self
                .stage
                .attributes(terrain)
                .map_or(true, |a| a.is_passable()),
            None => true,
        }
    }

    /// Resource id of the terrain occupant, if it is a resource source.
    pub fn resource(&self) -> Option<String> {
        let terrain = self.occupant(TERRAIN_SLOT)?;
        self.stage
            .world
            .get::<&ResourceSource>(terrain)
            .ok()
            .map(|r| r.resource.clone())
    }

    pub fn mass(&self) -> f64 {
        self.stage
            .world
            .get::<&Chunk>(self.entity)
            .map(|c| c.mass)
            .unwrap_or(0.0)
    }
}

/// Default pathfinding validator: missing chunks and impassable chunks block.
pub fn blocks_movement(chunk: Option<ChunkRef<'_>>) -> bool {
    chunk.map_or(true, |c| !c.passable())
}

impl Stage {
    /// Build a visible map root with a chunk per cell.
    pub fn create_map(&mut self, size: Vector) -> Result<Entity, StageError> {
        let map = self.spawn_with(NodeKind::Map, (Transform::at(Vector::ZERO), MapGrid { size }));
        self.attach_root(map)?;
        self.set_visible(map, true)?;

        let (width, height) = grid_dimensions(size);
        for x in 0..width {
            for y in 0..height {
                let position = Vector::new(x as f64, y as f64);
                let chunk = self.spawn_with(NodeKind::Chunk, (Transform::at(position), Chunk::default()));
                self.add_child(map, chunk)?;
                self.set_visible(chunk, true)?;
            }
        }

        log::info!("Created {}x{} map with {} chunks", width, height, width * height);
        Ok(map)
    }

    pub fn map_size(&self, map: Entity) -> Option<Vector> {
        self.world.get::<&MapGrid>(map).ok().map(|g| g.size)
    }

    /// View `entity` as a chunk.
    pub fn chunk(&self, entity: Entity) -> Option<ChunkRef<'_>> {
        match self.kind(entity) {
            Some(NodeKind::Chunk) => Some(ChunkRef { stage: self, entity }),
            _ => None,
        }
    }

    /// Chunk at the floored `position`, `None` when outside the grid.
    pub fn get_chunk(&self, map: Entity, position: Vector) -> Option<ChunkRef<'_>> {
        if position.is_empty() {
            return None;
        }
        let cell = position.floor();
        self.children(map)
            .into_iter()
            .filter_map(|e| self.chunk(e))
            .find(|c| c.position() == cell)
    }

    /// Live actors of `map` whose floored position equals the floored `position`.
    pub fn get_entities(&self, map: Entity, position: Vector) -> Vec<Entity> {
        let cell = position.floor();
        self.children(map)
            .into_iter()
            .filter(|&e| self.is_alive(e) && self.kind(e).map_or(false, |k| k.is_actor()))
            .filter(|&e| self.position(e).map_or(false, |p| !p.is_empty() && p.floor() == cell))
            .collect()
    }

    /// Chunks matching `predicate`, in construction order.
    pub fn lookup_chunk<F>(&self, map: Entity, mut predicate: F) -> Vec<ChunkRef<'_>>
    where
        F: FnMut(&ChunkRef<'_>) -> bool,
    {
        self.children(map)
            .into_iter()
            .filter_map(|e| self.chunk(e))
            .filter(|c| predicate(c))
            .collect()
    }

    /// The map an actor or chunk belongs to.
    pub fn map_of(&self, entity: Entity) -> Option<Entity> {
        let mut current = self.parent(entity);
        while let Some(e) = current {
            if self.kind(e) == Some(NodeKind::Map) {
                return Some(e);
            }
            current = self.parent(e);
        }
        None
    }

    /// The chunk an occupant sits in, or the chunk under an actor.
    pub fn chunk_of(&self, entity: Entity) -> Option<ChunkRef<'_>> {
        let parent = self.parent(entity)?;
        if let Some(chunk) = self.chunk(parent) {
            return Some(chunk);
        }
        if self.kind(parent) == Some(NodeKind::Map) {
            return self.get_chunk(parent, self.position(entity)?);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_created_x_outer_y_inner() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(3.0, 2.0)).unwrap();
        let cells: Vec<Vector> = stage
            .lookup_chunk(map, |_| true)
            .iter()
            .map(|c| c.position())
            .collect();
        assert_eq!(
            cells,
            vec![
                Vector::new(0.0, 0.0),
                Vector::new(0.0, 1.0),
                Vector::new(1.0, 0.0),
                Vector::new(1.0, 1.0),
                Vector::new(2.0, 0.0),
                Vector::new(2.0, 1.0),
            ]
        );
        assert_eq!(stage.depth(stage.children(map)[0]), Some(1));
    }

    #[test]
    fn test_get_chunk_floors_and_misses_outside() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(2.0, 2.0)).unwrap();
        let chunk = stage.get_chunk(map, Vector::new(1.7, 0.2)).unwrap();
        assert_eq!(chunk.position(), Vector::new(1.0, 0.0));
        assert!(stage.get_chunk(map, Vector::new(2.0, 0.0)).is_none());
        assert!(stage.get_chunk(map, Vector::new(-0.5, 0.0)).is_none());
        assert!(stage.get_chunk(map, Vector::NULL).is_none());
    }

    #[test]
    fn test_passability_from_terrain_slot() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(2.0, 1.0)).unwrap();
        let chunk = stage.get_chunk(map, Vector::new(1.0, 0.0)).unwrap().entity();
        assert!(!blocks_movement(stage.chunk(chunk)));

        let wall = stage.spawn_with(NodeKind::Terrain(TerrainKind::Wall), (Attributes::impassable(),));
        stage.set_child(chunk, TERRAIN_SLOT, wall).unwrap();
        assert!(blocks_movement(stage.chunk(chunk)));
        assert_eq!(stage.chunk(chunk).unwrap().terrain(), Some(TerrainKind::Wall));
        assert!(blocks_movement(None));
    }

    #[test]
    fn test_get_entities_matches_floored_cell() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(3.0, 3.0)).unwrap();
        let actor = stage.spawn_with(
            NodeKind::Actor(ActorKind::Generic),
            (Transform::at(Vector::new(1.5, 2.25)),),
        );
        stage.add_child(map, actor).unwrap();

        assert_eq!(stage.get_entities(map, Vector::new(1.0, 2.0)), vec![actor]);
        assert!(stage.get_entities(map, Vector::new(2.0, 1.0)).is_empty());
        assert_eq!(stage.map_of(actor), Some(map));
        assert_eq!(
            stage.chunk_of(actor).map(|c| c.position()),
            Some(Vector::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_resource_occupant() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(1.0, 1.0)).unwrap();
        let chunk = stage.children(map)[0];
        let resource = stage.spawn_with(
            NodeKind::Terrain(TerrainKind::ResourcePoint),
            (ResourceSource {
                resource: "codingland.wood".into(),
            },),
        );
        stage.set_child(chunk, TERRAIN_SLOT, resource).unwrap();
        let view = stage.chunk(chunk).unwrap();
        assert_eq!(view.resource().as_deref(), Some("codingland.wood"));
        assert!(view.passable());
        assert_eq!(stage.chunk_of(resource).map(|c| c.entity()), Some(chunk));
    }
}
