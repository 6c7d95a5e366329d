//! Health and damage for actors and buildings.

use codingland_logic::constants::UNDER_ATTACK_MS;
use hecs::Entity;
use std::time::Duration;

use crate::components::{EffectKind, Health, Presentation};
use crate::error::StageError;
use crate::stage::Stage;

/// Lower `entity`'s health by `amount` and flash the under-attack highlight.
/// Returns the remaining health.
pub fn take_damage(stage: &mut Stage, entity: Entity, amount: f64) -> Result<f64, StageError> {
    if !stage.is_alive(entity) {
        return Err(StageError::Disposed(entity));
    }
    let remaining = {
        let mut health = stage
            .world
            .get::<&mut Health>(entity)
            .map_err(|_| StageError::PreconditionViolation(format!("{:?} has no health", entity)))?;
        health.current -= amount;
        health.current
    };

    if let Ok(mut presentation) = stage.world.get::<&mut Presentation>(entity) {
        presentation.push_effect(EffectKind::UnderAttack, Duration::from_millis(UNDER_ATTACK_MS));
    }
    log::debug!("{:?} took {} damage, {} left", entity, amount, remaining);
    Ok(remaining)
}

/// Health is gone and the node is not invincible.
pub fn is_defeated(stage: &Stage, entity: Entity) -> bool {
    let depleted = stage
        .world
        .get::<&Health>(entity)
        .map_or(false, |h| h.is_depleted());
    let invincible = stage.attributes(entity).map_or(false, |a| a.invincible);
    depleted && !invincible
}
