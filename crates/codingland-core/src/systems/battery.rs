//! Robot battery drain and the task gate.

use codingland_logic::production::drain_battery;
use hecs::Entity;

use crate::components::{Battery, Robot};
use crate::events::Message;
use crate::stage::Stage;

/// Use one tick of charge. Returns the charge left, `None` for non-robots.
pub fn drain_robot(stage: &mut Stage, robot: Entity) -> Option<u32> {
    let mut battery = stage.world.get::<&mut Battery>(robot).ok()?;
    battery.power = drain_battery(battery.power);
    Some(battery.power)
}

/// Gate run before a robot executes a task. An empty battery refuses the
/// task with a warning for the player.
pub fn before_execute_task(stage: &Stage, robot: Entity) -> Result<(), Message> {
    let empty = stage
        .world
        .get::<&Battery>(robot)
        .map_or(false, |b| b.is_empty());
    if !empty {
        return Ok(());
    }
    let name = stage
        .world
        .get::<&Robot>(robot)
        .map(|r| r.name.clone())
        .unwrap_or_default();
    let text = format!("Robot {} has run out of battery and cannot perform tasks", name);
    log::warn!("{}", text);
    Err(Message::warning(text))
}
