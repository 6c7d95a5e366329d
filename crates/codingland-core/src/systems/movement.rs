//! Movement system - grid steps for actors on a map.

use codingland_logic::constants::BOUNCE_MS;
use codingland_logic::Vector;
use hecs::Entity;
use std::time::Duration;

use crate::components::{EffectKind, Lifecycle, Presentation};
use crate::error::StageError;
use crate::stage::Stage;

/// Try to move `entity` by `direction`.
///
/// The target is floored only to find its chunk; sub-tile positions are kept.
/// A missing or impassable chunk refuses the move: the logical position stays
/// put and a half-step nudge plays for a moment. Returns whether the move
/// was committed.
pub fn move_entity(stage: &mut Stage, entity: Entity, direction: Vector) -> Result<bool, StageError> {
    match stage.state(entity) {
        None => return Err(StageError::MissingNode(entity)),
        Some(Lifecycle::Disposed) => return Err(StageError::Disposed(entity)),
        Some(_) => {}
    }
    let map = stage.map_of(entity).ok_or(StageError::NotOnMap(entity))?;
    let position = stage
        .position(entity)
        .filter(|p| !p.is_empty())
        .ok_or(StageError::NotOnMap(entity))?;

    let target = position.add(direction);
    let allowed = stage.get_chunk(map, target).map_or(false, |c| c.passable());

    if allowed {
        stage.set_position(entity, target)?;
        stage.set_direction(entity, direction)?;
        return Ok(true);
    }

    if let Ok(mut presentation) = stage.world.get::<&mut Presentation>(entity) {
        presentation.push_effect(
            EffectKind::Nudge {
                offset: direction.multiply(0.5),
            },
            Duration::from_millis(BOUNCE_MS),
        );
    }
    log::trace!("Move of {:?} toward {} refused", entity, target);
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ActorKind;
    use crate::generation::prefabs;
    use codingland_logic::constants::TERRAIN_SLOT;
    use codingland_logic::Direction;

    fn setup() -> (Stage, Entity) {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(3.0, 1.0)).unwrap();
        let chunk = stage.get_chunk(map, Vector::new(2.0, 0.0)).unwrap().entity();
        let wall = prefabs::wall(&mut stage);
        stage.set_child(chunk, TERRAIN_SLOT, wall).unwrap();
        let actor = prefabs::actor(&mut stage, ActorKind::Generic, Vector::ZERO);
        stage.add_child(map, actor).unwrap();
        (stage, actor)
    }

    #[test]
    fn test_move_into_open_chunk() {
        let (mut stage, actor) = setup();
        assert!(move_entity(&mut stage, actor, Direction::Right.vector()).unwrap());
        assert_eq!(stage.position(actor), Some(Vector::new(1.0, 0.0)));
        assert_eq!(stage.direction(actor), Some(Direction::Right.vector()));
    }

    #[test]
    fn test_wall_refuses_and_nudges() {
        let (mut stage, actor) = setup();
        stage.set_position(actor, Vector::new(1.0, 0.0)).unwrap();
        assert!(!move_entity(&mut stage, actor, Direction::Right.vector()).unwrap());
        assert_eq!(stage.position(actor), Some(Vector::new(1.0, 0.0)));

        let p = stage.world.get::<&Presentation>(actor).unwrap();
        assert_eq!(p.offset(), Vector::new(0.5, 0.0));
    }

    #[test]
    fn test_off_map_refused() {
        let (mut stage, actor) = setup();
        assert!(!move_entity(&mut stage, actor, Direction::Left.vector()).unwrap());
        assert!(!move_entity(&mut stage, actor, Direction::Up.vector()).unwrap());
        assert_eq!(stage.position(actor), Some(Vector::ZERO));
    }

    #[test]
    fn test_sub_tile_positions_kept() {
        let (mut stage, actor) = setup();
        assert!(move_entity(&mut stage, actor, Vector::new(0.5, 0.25)).unwrap());
        assert_eq!(stage.position(actor), Some(Vector::new(0.5, 0.25)));
    }

    #[test]
    fn test_disposed_never_moves() {
        let (mut stage, actor) = setup();
        stage.dispose(actor).unwrap();
        assert_eq!(
            move_entity(&mut stage, actor, Direction::Right.vector()),
            Err(StageError::Disposed(actor))
        );
    }
}
