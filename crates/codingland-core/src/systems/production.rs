//! Production system - resource miners.

use codingland_logic::constants::BUILDING_SLOT;
use codingland_logic::production::Countdown;
use hecs::Entity;

use crate::components::Miner;
use crate::error::StageError;
use crate::stage::Stage;

/// One completed production cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub source: Entity,
    pub item: String,
    pub count: u32,
}

/// A miner can produce when it sits in the building slot of a chunk whose
/// terrain slot holds a resource source.
pub fn miner_is_valid(stage: &Stage, miner: Entity) -> bool {
    match stage.chunk_of(miner) {
        Some(chunk) => chunk.occupant(BUILDING_SLOT) == Some(miner) && chunk.resource().is_some(),
        None => false,
    }
}

/// Resource id the miner extracts.
pub fn product(stage: &Stage, miner: Entity) -> Result<String, StageError> {
    if !miner_is_valid(stage, miner) {
        return Err(StageError::PreconditionViolation(
            "miner is not placed on a resource point".to_string(),
        ));
    }
    stage
        .chunk_of(miner)
        .and_then(|c| c.resource())
        .ok_or_else(|| StageError::PreconditionViolation("chunk has no resource".to_string()))
}

/// Advance a miner's countdown by one tick. When the cycle completes the
/// countdown restarts and, if the miner is valid, the output is returned.
pub fn update_miner(stage: &mut Stage, miner: Entity) -> Option<Production> {
    let (due, count) = {
        let mut state = stage.world.get::<&mut Miner>(miner).ok()?;
        let cycle = state.max_countdown();
        let mut countdown = Countdown::new(state.countdown);
        let due = countdown.tick(cycle);
        state.countdown = countdown.remaining;
        (due, state.output_count())
    };
    if !due {
        return None;
    }

    match product(stage, miner) {
        Ok(item) => Some(Production {
            source: miner,
            item,
            count,
        }),
        Err(_) => {
            log::debug!("Miner {:?} finished a cycle off a resource point", miner);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prefabs;
    use codingland_logic::constants::{RESOURCE_WOOD, TERRAIN_SLOT};
    use codingland_logic::Vector;

    fn placed(level: u32, on_resource: bool) -> (Stage, Entity) {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(1.0, 1.0)).unwrap();
        let chunk = stage.children(map)[0];
        if on_resource {
            let resource = prefabs::resource_point(&mut stage, RESOURCE_WOOD);
            stage.set_child(chunk, TERRAIN_SLOT, resource).unwrap();
        }
        let miner = prefabs::miner(&mut stage, level);
        stage.set_child(chunk, BUILDING_SLOT, miner).unwrap();
        (stage, miner)
    }

    #[test]
    fn test_level_one_produces_once_in_thirty_ticks() {
        let (mut stage, miner) = placed(1, true);
        let produced: Vec<Production> = (0..30).filter_map(|_| update_miner(&mut stage, miner)).collect();
        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].count, 10);
        assert_eq!(produced[0].item, RESOURCE_WOOD);
    }

    #[test]
    fn test_level_three_cycle() {
        let (mut stage, miner) = placed(3, true);
        let ticks: Vec<usize> = (1..=56)
            .filter(|_| update_miner(&mut stage, miner).is_some())
            .collect();
        assert_eq!(ticks, vec![28, 56]);
        assert_eq!(stage.world.get::<&Miner>(miner).unwrap().output_count(), 14);
    }

    #[test]
    fn test_invalid_miner_is_silent_but_resets() {
        let (mut stage, miner) = placed(1, false);
        assert!(!miner_is_valid(&stage, miner));
        assert!((0..60).all(|_| update_miner(&mut stage, miner).is_none()));
        assert_eq!(stage.world.get::<&Miner>(miner).unwrap().countdown, 30);
        assert!(matches!(
            product(&stage, miner),
            Err(StageError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_miner_in_terrain_slot_is_invalid() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(1.0, 1.0)).unwrap();
        let chunk = stage.children(map)[0];
        let miner = prefabs::miner(&mut stage, 1);
        stage.set_child(chunk, TERRAIN_SLOT, miner).unwrap();
        assert!(!miner_is_valid(&stage, miner));
    }
}
