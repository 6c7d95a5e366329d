//! Save/Load functionality for persisting the stage
//!
//! The save is a plain record tree: a column-major grid of tiles, each with
//! its terrain material, building and non-robot actors, plus robots keyed by
//! name. Every record carries everything needed to rebuild its node, so a
//! stage can be reconstructed from the data alone. Binary saves use bincode,
//! human-readable saves use JSON; both carry [`SAVE_VERSION`].

use codingland_logic::constants::{BUILDING_SLOT, RESOURCE_WOOD, TERRAIN_SLOT};
use codingland_logic::pathfinding::grid_dimensions;
use codingland_logic::Vector;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::*;
use crate::error::StageError;
use crate::generation::prefabs;
use crate::inventory::Inventory;
use crate::stage::Stage;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Terrain occupant of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMaterial {
    pub kind: TerrainKind,
    pub resource: Option<String>,
    pub attributes: Attributes,
}

/// Building occupant of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuilding {
    pub kind: BuildingKind,
    pub miner: Option<Miner>,
    pub health: Option<Health>,
    pub attributes: Attributes,
}

/// A mobile actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    pub kind: ActorKind,
    pub position: Vector,
    pub direction: Vector,
    pub health: Option<Health>,
    pub attributes: Attributes,
    pub robot: Option<Robot>,
    pub battery: Option<Battery>,
    pub seeker: Option<Seeker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTile {
    pub position: Vector,
    pub material: Option<SavedMaterial>,
    pub building: Option<SavedBuilding>,
    pub entities: Vec<SavedEntity>,
    /// Tile mass in kilograms.
    pub mass: f64,
}

/// Serializable snapshot of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Map width and height in cells
    pub size: [u32; 2],
    /// `tiles[x][y]`
    pub tiles: Vec<Vec<SavedTile>>,
    pub robots: BTreeMap<String, SavedEntity>,
    pub tick: u64,
    pub inventory: Inventory,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("no map to save")]
    MissingMap,
    #[error(transparent)]
    Stage(#[from] StageError),
}

// ── Capture ─────────────────────────────────────────────────────────────

fn save_material(stage: &Stage, entity: Entity) -> Option<SavedMaterial> {
    let kind = stage.kind(entity)?.terrain()?;
    Some(SavedMaterial {
        kind,
        resource: stage
            .world
            .get::<&ResourceSource>(entity)
            .ok()
            .map(|r| r.resource.clone()),
        attributes: stage.attributes(entity).unwrap_or_default(),
    })
}

fn save_building(stage: &Stage, entity: Entity) -> Option<SavedBuilding> {
    let kind = stage.kind(entity)?.building()?;
    Some(SavedBuilding {
        kind,
        miner: stage.world.get::<&Miner>(entity).ok().map(|m| *m),
        health: stage.health(entity),
        attributes: stage.attributes(entity).unwrap_or_default(),
    })
}

fn save_entity(stage: &Stage, entity: Entity) -> Option<SavedEntity> {
    let kind = stage.kind(entity)?.actor()?;
    Some(SavedEntity {
        kind,
        position: stage.position(entity).unwrap_or(Vector::NULL),
        direction: stage.direction(entity).unwrap_or(Vector::ZERO),
        health: stage.health(entity),
        attributes: stage.attributes(entity).unwrap_or_default(),
        robot: stage.world.get::<&Robot>(entity).ok().map(|r| (*r).clone()),
        battery: stage.world.get::<&Battery>(entity).ok().map(|b| *b),
        seeker: stage.world.get::<&Seeker>(entity).ok().map(|s| *s),
    })
}

/// Capture `map` and everything on it.
pub fn snapshot(
    stage: &Stage,
    map: Entity,
    inventory: &Inventory,
    tick: u64,
) -> Result<SaveData, SaveError> {
    let size = stage.map_size(map).ok_or(SaveError::MissingMap)?;
    let (width, height) = grid_dimensions(size);

    let mut tiles: Vec<Vec<SavedTile>> = Vec::with_capacity(width);
    for x in 0..width {
        let mut column = Vec::with_capacity(height);
        for y in 0..height {
            let cell = Vector::new(x as f64, y as f64);
            let chunk = stage
                .get_chunk(map, cell)
                .ok_or(StageError::OutOfBounds(cell))?;
            column.push(SavedTile {
                position: cell,
                material: chunk
                    .occupant(TERRAIN_SLOT)
                    .and_then(|e| save_material(stage, e)),
                building: chunk
                    .occupant(BUILDING_SLOT)
                    .and_then(|e| save_building(stage, e)),
                entities: Vec::new(),
                mass: chunk.mass(),
            });
        }
        tiles.push(column);
    }

    let mut robots = BTreeMap::new();
    for actor in stage.children(map) {
        if !stage.is_alive(actor) {
            continue;
        }
        let Some(record) = save_entity(stage, actor) else {
            continue;
        };
        if let Some(robot) = &record.robot {
            robots.insert(robot.name.clone(), record);
            continue;
        }
        match record.position.cell() {
            Some((x, y)) if x < width && y < height => tiles[x][y].entities.push(record),
            _ => log::warn!("Actor {:?} is outside the grid, not saved", actor),
        }
    }

    Ok(SaveData {
        version: SAVE_VERSION,
        size: [width as u32, height as u32],
        tiles,
        robots,
        tick,
        inventory: inventory.clone(),
    })
}

// ── Rebuild ─────────────────────────────────────────────────────────────

fn restore_material(stage: &mut Stage, record: &SavedMaterial) -> Result<Entity, StageError> {
    let resource = record.resource.as_deref().unwrap_or(RESOURCE_WOOD);
    let entity = prefabs::terrain(stage, record.kind, resource);
    stage.update_attributes(entity, |a| *a = record.attributes.clone())?;
    Ok(entity)
}

fn restore_building(stage: &mut Stage, record: &SavedBuilding) -> Result<Entity, StageError> {
    let entity = match record.kind {
        BuildingKind::ResourceMiner => {
            prefabs::miner(stage, record.miner.map_or(1, |m| m.level))
        }
    };
    if let Some(miner) = record.miner {
        let _ = stage.world.insert_one(entity, miner);
    }
    if let Some(health) = record.health {
        let _ = stage.world.insert_one(entity, health);
    }
    stage.update_attributes(entity, |a| *a = record.attributes.clone())?;
    Ok(entity)
}

fn restore_entity(stage: &mut Stage, record: &SavedEntity) -> Result<Entity, StageError> {
    let entity = prefabs::actor(stage, record.kind, record.position);
    stage.set_direction(entity, record.direction)?;
    if let Some(health) = record.health {
        let _ = stage.world.insert_one(entity, health);
    }
    if let Some(robot) = &record.robot {
        let _ = stage.world.insert_one(entity, robot.clone());
    }
    if let Some(battery) = record.battery {
        let _ = stage.world.insert_one(entity, battery);
    }
    if let Some(seeker) = record.seeker {
        let _ = stage.world.insert_one(entity, seeker);
    }
    stage.update_attributes(entity, |a| *a = record.attributes.clone())?;
    Ok(entity)
}

/// Result of rebuilding a stage from a save.
pub struct Restored {
    pub stage: Stage,
    pub map: Entity,
    pub robots: BTreeMap<String, Entity>,
    pub tick: u64,
    pub inventory: Inventory,
}

/// Rebuild a fresh stage from `data`.
pub fn restore(data: SaveData) -> Result<Restored, SaveError> {
    check_version(data.version)?;

    let mut stage = Stage::new();
    let [width, height] = data.size;
    let map = stage.create_map(Vector::new(width as f64, height as f64))?;

    for tile in data.tiles.iter().flatten() {
        let chunk = stage
            .get_chunk(map, tile.position)
            .map(|c| c.entity())
            .ok_or(StageError::OutOfBounds(tile.position))?;
        if let Ok(mut c) = stage.world.get::<&mut Chunk>(chunk) {
            c.mass = tile.mass;
        }
        if let Some(material) = &tile.material {
            let terrain = restore_material(&mut stage, material)?;
            stage.set_child(chunk, TERRAIN_SLOT, terrain)?;
        }
        if let Some(building) = &tile.building {
            let unit = restore_building(&mut stage, building)?;
            stage.set_child(chunk, BUILDING_SLOT, unit)?;
        }
        for record in &tile.entities {
            let actor = restore_entity(&mut stage, record)?;
            stage.add_child(map, actor)?;
        }
    }

    let mut robots = BTreeMap::new();
    for (name, record) in &data.robots {
        let actor = restore_entity(&mut stage, record)?;
        stage.add_child(map, actor)?;
        robots.insert(name.clone(), actor);
    }

    log::info!(
        "Restored {}x{} map with {} robot(s) at tick {}",
        width,
        height,
        robots.len(),
        data.tick
    );
    Ok(Restored {
        stage,
        map,
        robots,
        tick: data.tick,
        inventory: data.inventory,
    })
}

fn check_version(found: u32) -> Result<(), SaveError> {
    if found != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

// ── Encoding ────────────────────────────────────────────────────────────

pub fn write_binary<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    Ok(())
}

pub fn read_binary<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    check_version(data.version)?;
    Ok(data)
}

pub fn to_json(data: &SaveData) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn from_json(json: &str) -> Result<SaveData, SaveError> {
    let data: SaveData = serde_json::from_str(json)?;
    check_version(data.version)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Stage, Entity, Inventory) {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(3.0, 2.0)).unwrap();

        let chunk = stage.get_chunk(map, Vector::new(1.0, 1.0)).unwrap().entity();
        let resource = prefabs::resource_point(&mut stage, RESOURCE_WOOD);
        stage.set_child(chunk, TERRAIN_SLOT, resource).unwrap();
        let miner = prefabs::miner(&mut stage, 2);
        stage.set_child(chunk, BUILDING_SLOT, miner).unwrap();

        let wall_chunk = stage.get_chunk(map, Vector::new(2.0, 0.0)).unwrap().entity();
        let wall = prefabs::wall(&mut stage);
        stage.set_child(wall_chunk, TERRAIN_SLOT, wall).unwrap();

        let robot = prefabs::robot(&mut stage, "digger", Vector::new(0.0, 1.0), 1600);
        stage.add_child(map, robot).unwrap();
        let enemy = prefabs::enemy(&mut stage, ActorKind::EnemyEngineer, Vector::new(0.5, 0.0), 5);
        stage.add_child(map, enemy).unwrap();

        let mut inventory = Inventory::new();
        inventory.add_item(RESOURCE_WOOD, 12);
        (stage, map, inventory)
    }

    #[test]
    fn test_snapshot_shape() {
        let (stage, map, inventory) = sample();
        let data = snapshot(&stage, map, &inventory, 40).unwrap();
        assert_eq!(data.size, [3, 2]);
        assert_eq!(data.tiles.len(), 3);
        assert_eq!(data.tiles[0].len(), 2);

        let tile = &data.tiles[1][1];
        assert_eq!(tile.material.as_ref().unwrap().kind, TerrainKind::ResourcePoint);
        assert_eq!(tile.building.as_ref().unwrap().miner.unwrap().level, 2);
        assert_eq!(data.tiles[2][0].material.as_ref().unwrap().attributes.passable, Some(false));

        assert_eq!(data.tiles[0][0].entities.len(), 1);
        assert_eq!(data.tiles[0][0].entities[0].kind, ActorKind::EnemyEngineer);
        assert!(data.robots.contains_key("digger"));
    }

    #[test]
    fn test_binary_save_restores_stage() {
        let (stage, map, inventory) = sample();
        let data = snapshot(&stage, map, &inventory, 40).unwrap();

        let mut buffer = Vec::new();
        write_binary(&mut buffer, &data).unwrap();
        let restored = restore(read_binary(&buffer[..]).unwrap()).unwrap();

        assert_eq!(restored.tick, 40);
        assert_eq!(restored.inventory.count(RESOURCE_WOOD), 12);
        let robot = restored.robots["digger"];
        assert_eq!(restored.stage.position(robot), Some(Vector::new(0.0, 1.0)));

        let chunk = restored.stage.get_chunk(restored.map, Vector::new(2.0, 0.0)).unwrap();
        assert!(!chunk.passable());

        // Saving the restored stage gives the same record tree.
        let again = snapshot(&restored.stage, restored.map, &restored.inventory, restored.tick).unwrap();
        assert_eq!(again, data);
    }

    #[test]
    fn test_json_save() {
        let (stage, map, inventory) = sample();
        let data = snapshot(&stage, map, &inventory, 3).unwrap();
        let json = to_json(&data).unwrap();
        assert!(json.contains("\"tiles\""));
        assert!(json.contains("\"robots\""));
        assert_eq!(from_json(&json).unwrap(), data);
    }

    #[test]
    fn test_version_mismatch() {
        let (stage, map, inventory) = sample();
        let mut data = snapshot(&stage, map, &inventory, 0).unwrap();
        data.version = 99;
        let mut buffer = Vec::new();
        write_binary(&mut buffer, &data).unwrap();
        assert!(matches!(
            read_binary(&buffer[..]),
            Err(SaveError::VersionMismatch { expected: 1, found: 99 })
        ));
    }
}
