//! Enemy pursuit - walk toward the base one step at a time.
//!
//! Each due step consumes the path found for the previous step and queues a
//! fresh search, so an enemy always acts on a path at most one step stale.

use codingland_logic::Vector;
use hecs::Entity;
use std::collections::HashMap;

use super::movement::move_entity;
use super::pathfinding::{PathRequest, PathScheduler, SearchMode};
use crate::components::{Seeker, TerrainKind};
use crate::error::StageError;
use crate::map::blocks_movement;
use crate::stage::Stage;

/// Cells of every base on `map`.
pub fn base_targets(stage: &Stage, map: Entity) -> Vec<Vector> {
    stage
        .lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::Base))
        .iter()
        .map(|c| c.position())
        .collect()
}

/// Outstanding path requests of every pursuing enemy.
#[derive(Default)]
pub struct Pursuits {
    requests: HashMap<Entity, PathRequest>,
}

impl Pursuits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one enemy by a tick. Returns whether it moved.
    pub fn advance(
        &mut self,
        stage: &mut Stage,
        paths: &mut PathScheduler,
        enemy: Entity,
    ) -> Result<bool, StageError> {
        let due = stage
            .world
            .get::<&mut Seeker>(enemy)
            .map(|mut seeker| seeker.tick())
            .unwrap_or(false);
        if !due {
            return Ok(false);
        }

        let mut moved = false;
        if let Some(request) = self.requests.remove(&enemy) {
            if let Some(Ok(result)) = request.try_result() {
                if let Some(direction) = result.direction() {
                    moved = move_entity(stage, enemy, direction.vector())?;
                }
            }
        }

        let map = stage.map_of(enemy).ok_or(StageError::NotOnMap(enemy))?;
        let targets = base_targets(stage, map);
        if !targets.is_empty() {
            let request = paths.request(stage, enemy, targets, blocks_movement, SearchMode::Queued);
            self.requests.insert(enemy, request);
        }
        Ok(moved)
    }

    /// Drop the request held for `enemy`.
    pub fn forget(&mut self, enemy: Entity) -> Option<PathRequest> {
        self.requests.remove(&enemy)
    }

    pub fn is_tracking(&self, enemy: Entity) -> bool {
        self.requests.contains_key(&enemy)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
