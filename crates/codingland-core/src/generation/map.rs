//! Random map generation.

use codingland_logic::constants::TERRAIN_SLOT;
use codingland_logic::Vector;
use hecs::Entity;
use rand::Rng;

use super::prefabs;
use crate::config::MapConfig;
use crate::error::StageError;
use crate::stage::Stage;

/// Handles of the landmarks placed on a generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landmarks {
    pub entrance: Entity,
    pub base: Entity,
}

/// Create a map per `config`. Returns the map root and, when terrain is
/// generated on a non-empty grid, the entrance and base.
pub fn generate_map(
    stage: &mut Stage,
    config: &MapConfig,
    rng: &mut impl Rng,
) -> Result<(Entity, Option<Landmarks>), StageError> {
    let size = Vector::new(config.width as f64, config.height as f64);
    let map = stage.create_map(size)?;
    if !config.generate_terrain || config.width == 0 || config.height == 0 {
        return Ok((map, None));
    }

    let chunks = stage.children(map);
    let mut walls = 0;
    let mut resources = 0;
    for chunk in chunks {
        if rng.gen::<f64>() > config.wall_threshold {
            let wall = prefabs::wall(stage);
            stage.set_child(chunk, TERRAIN_SLOT, wall)?;
            walls += 1;
        } else if rng.gen::<f64>() > config.resource_threshold {
            let resource = prefabs::resource_point(stage, &config.resource);
            stage.set_child(chunk, TERRAIN_SLOT, resource)?;
            resources += 1;
        }
    }

    let landmarks = place_landmarks(stage, map, size, rng)?;
    log::info!(
        "Generated terrain: {} walls, {} resource points",
        walls,
        resources
    );
    Ok((map, Some(landmarks)))
}

/// Put an entrance and a base on random cells, replacing whatever terrain
/// was there. The cells differ whenever the map has more than one.
fn place_landmarks(
    stage: &mut Stage,
    map: Entity,
    size: Vector,
    rng: &mut impl Rng,
) -> Result<Landmarks, StageError> {
    let (width, height) = size.extract();
    let entrance_cell = Vector::range_random(rng, 0.0, width, 0.0, height);
    let mut base_cell = Vector::range_random(rng, 0.0, width, 0.0, height);
    while width * height > 1.0 && base_cell == entrance_cell {
        base_cell = Vector::range_random(rng, 0.0, width, 0.0, height);
    }

    let entrance_chunk = stage
        .get_chunk(map, entrance_cell)
        .map(|c| c.entity())
        .ok_or(StageError::OutOfBounds(entrance_cell))?;
    let base_chunk = stage
        .get_chunk(map, base_cell)
        .map(|c| c.entity())
        .ok_or(StageError::OutOfBounds(base_cell))?;

    let entrance = prefabs::entrance(stage);
    stage.set_child(entrance_chunk, TERRAIN_SLOT, entrance)?;
    let base = prefabs::base(stage);
    stage.set_child(base_chunk, TERRAIN_SLOT, base)?;

    log::debug!("Entrance at {}, base at {}", entrance_cell, base_cell);
    Ok(Landmarks { entrance, base })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TerrainKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blank_map_has_no_terrain() {
        let mut stage = Stage::new();
        let mut rng = StdRng::seed_from_u64(1);
        let (map, landmarks) = generate_map(&mut stage, &MapConfig::blank(4, 3), &mut rng).unwrap();
        assert!(landmarks.is_none());
        assert_eq!(stage.lookup_chunk(map, |c| c.terrain().is_some()).len(), 0);
        assert_eq!(stage.children(map).len(), 12);
    }

    #[test]
    fn test_generated_map_has_one_entrance_and_one_base() {
        for seed in 0..20 {
            let mut stage = Stage::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let (map, landmarks) =
                generate_map(&mut stage, &MapConfig::default(), &mut rng).unwrap();
            let landmarks = landmarks.unwrap();

            let entrances = stage.lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::Entrance));
            let bases = stage.lookup_chunk(map, |c| c.terrain() == Some(TerrainKind::Base));
            assert_eq!(entrances.len(), 1);
            assert_eq!(bases.len(), 1);
            assert_ne!(entrances[0].position(), bases[0].position());
            assert!(stage.is_alive(landmarks.entrance));
            assert!(stage.is_alive(landmarks.base));
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let layout = |seed| {
            let mut stage = Stage::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let (map, _) = generate_map(&mut stage, &MapConfig::default(), &mut rng).unwrap();
            stage
                .lookup_chunk(map, |_| true)
                .iter()
                .map(|c| c.terrain())
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(9), layout(9));
    }

    #[test]
    fn test_single_cell_map() {
        let mut stage = Stage::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = MapConfig {
            width: 1,
            height: 1,
            ..Default::default()
        };
        let (map, landmarks) = generate_map(&mut stage, &config, &mut rng).unwrap();
        let landmarks = landmarks.unwrap();
        // Base overwrites the entrance in the only cell.
        assert!(!stage.is_alive(landmarks.entrance));
        let chunk = stage.children(map)[0];
        assert_eq!(stage.chunk(chunk).unwrap().terrain(), Some(TerrainKind::Base));
    }
}
