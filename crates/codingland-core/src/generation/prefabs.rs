//! Spawn helpers for every concrete stage object.
//!
//! Prefabs come out visible and unattached; callers install them with
//! `add_child` or `set_child`.

use codingland_logic::constants::{ENTITY_MAX_HEALTH, MINER_MAX_HEALTH};
use codingland_logic::Vector;
use hecs::Entity;

use crate::components::*;
use crate::stage::Stage;

pub fn resource_point(stage: &mut Stage, resource: &str) -> Entity {
    stage.spawn_visible(
        NodeKind::Terrain(TerrainKind::ResourcePoint),
        (ResourceSource {
            resource: resource.to_string(),
        },),
    )
}

pub fn wall(stage: &mut Stage) -> Entity {
    stage.spawn_visible(NodeKind::Terrain(TerrainKind::Wall), (Attributes::impassable(),))
}

pub fn entrance(stage: &mut Stage) -> Entity {
    stage.spawn_visible(NodeKind::Terrain(TerrainKind::Entrance), ())
}

pub fn base(stage: &mut Stage) -> Entity {
    stage.spawn_visible(
        NodeKind::Terrain(TerrainKind::Base),
        (Attributes::with_party(Party::Player),),
    )
}

/// Terrain of any kind. `resource` is only used by resource points.
pub fn terrain(stage: &mut Stage, kind: TerrainKind, resource: &str) -> Entity {
    match kind {
        TerrainKind::ResourcePoint => resource_point(stage, resource),
        TerrainKind::Wall => wall(stage),
        TerrainKind::Entrance => entrance(stage),
        TerrainKind::Base => base(stage),
    }
}

pub fn miner(stage: &mut Stage, level: u32) -> Entity {
    stage.spawn_visible(
        NodeKind::Building(BuildingKind::ResourceMiner),
        (
            Miner::new(level),
            Health::full(MINER_MAX_HEALTH),
            Attributes::with_party(Party::Player),
        ),
    )
}

/// A plain mobile actor with full health.
pub fn actor(stage: &mut Stage, kind: ActorKind, position: Vector) -> Entity {
    let party = if kind.is_enemy() {
        Party::Enemy
    } else {
        Party::Player
    };
    stage.spawn_visible(
        NodeKind::Actor(kind),
        (
            Transform::at(position),
            Health::full(ENTITY_MAX_HEALTH),
            Attributes::with_party(party),
        ),
    )
}

pub fn robot(stage: &mut Stage, name: &str, position: Vector, battery_capacity: u32) -> Entity {
    let entity = actor(stage, ActorKind::Robot, position);
    let _ = stage
        .world
        .insert(entity, (Robot::new(name), Battery::full(battery_capacity)));
    entity
}

/// An enemy that walks toward the base. Engineers move at half speed.
pub fn enemy(stage: &mut Stage, kind: ActorKind, position: Vector, step_interval: u32) -> Entity {
    let entity = actor(stage, kind, position);
    let interval = match kind {
        ActorKind::EnemyEngineer => step_interval.saturating_mul(2),
        _ => step_interval,
    };
    let _ = stage.world.insert_one(entity, Seeker::new(interval));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefabs_start_visible_and_unattached() {
        let mut stage = Stage::new();
        let w = wall(&mut stage);
        assert!(stage.is_visible(w));
        assert_eq!(stage.state(w), Some(Lifecycle::Unattached));
        assert!(!stage.attributes(w).unwrap().is_passable());
        let e = entrance(&mut stage);
        assert!(stage.attributes(e).unwrap().is_passable());
    }

    #[test]
    fn test_miner_defaults() {
        let mut stage = Stage::new();
        let m = miner(&mut stage, 1);
        assert_eq!(stage.health(m), Some(Health::full(MINER_MAX_HEALTH)));
        assert_eq!(stage.world.get::<&Miner>(m).unwrap().countdown, 30);
        assert_eq!(stage.attributes(m).unwrap().party, Some(Party::Player));
    }

    #[test]
    fn test_robot_carries_battery_and_script() {
        let mut stage = Stage::new();
        let r = robot(&mut stage, "rover", Vector::new(1.0, 1.0), 1600);
        assert_eq!(*stage.world.get::<&Battery>(r).unwrap(), Battery::full(1600));
        assert_eq!(stage.world.get::<&Robot>(r).unwrap().name, "rover");
        assert_eq!(stage.position(r), Some(Vector::new(1.0, 1.0)));
    }

    #[test]
    fn test_engineer_steps_slower() {
        let mut stage = Stage::new();
        let direct = enemy(&mut stage, ActorKind::EnemyDirectAttacker, Vector::ZERO, 5);
        let engineer = enemy(&mut stage, ActorKind::EnemyEngineer, Vector::ZERO, 5);
        assert_eq!(stage.world.get::<&Seeker>(direct).unwrap().step_interval, 5);
        assert_eq!(stage.world.get::<&Seeker>(engineer).unwrap().step_interval, 10);
        assert_eq!(stage.attributes(engineer).unwrap().party, Some(Party::Enemy));
    }
}
