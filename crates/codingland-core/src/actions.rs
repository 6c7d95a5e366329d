//! Context-action popups.
//!
//! The UI asks for a node's actions and gets back a plain descriptor; the
//! callbacks are named [`ActionKind`]s that the engine performs.

use codingland_logic::constants::BUILDING_SLOT;
use hecs::Entity;
use std::collections::BTreeMap;

use crate::components::*;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Destroy,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Destroy => "destroy",
        }
    }
}

/// Popup descriptor for a node's context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    /// Identifier of the content panel the UI should load, if any.
    pub content: Option<String>,
    pub caller: Entity,
    pub attributes: BTreeMap<String, bool>,
    pub callbacks: Vec<ActionKind>,
}

impl PopupOptions {
    pub fn has_action(&self, action: ActionKind) -> bool {
        self.callbacks.contains(&action)
    }
}

fn icon(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Building(BuildingKind::ResourceMiner) => "mdi mdi-pickaxe",
        NodeKind::Terrain(TerrainKind::ResourcePoint) => "mdi mdi-tree",
        NodeKind::Terrain(TerrainKind::Wall) => "mdi mdi-wall",
        NodeKind::Terrain(TerrainKind::Entrance) => "mdi mdi-door-open",
        NodeKind::Terrain(TerrainKind::Base) => "mdi mdi-home",
        NodeKind::Actor(ActorKind::Robot) => "mdi mdi-robot",
        NodeKind::Actor(a) if a.is_enemy() => "mdi mdi-skull",
        _ => "mdi mdi-help-rhombus",
    }
}

/// Build the popup for `entity`. `None` for unknown or disposed nodes.
pub fn render_actions(stage: &Stage, entity: Entity) -> Option<PopupOptions> {
    if !stage.is_alive(entity) {
        return None;
    }
    let kind = stage.kind(entity)?;
    let id = stage.object_id(entity)?;

    let mut options = PopupOptions {
        icon: icon(kind).to_string(),
        title: "Object".to_string(),
        subtitle: format!("#{}", id.short()),
        content: None,
        caller: entity,
        attributes: BTreeMap::new(),
        callbacks: Vec::new(),
    };

    match kind {
        NodeKind::Building(BuildingKind::ResourceMiner) => {
            let level = stage.world.get::<&Miner>(entity).map_or(1, |m| m.level);
            let established = stage
                .chunk_of(entity)
                .and_then(|c| c.occupant(BUILDING_SLOT))
                == Some(entity);
            options.title = "Resource Miner".to_string();
            options.subtitle = format!("Level {}", level);
            options.content = Some("actions/miner".to_string());
            options.attributes.insert("established".to_string(), established);
            options.callbacks.push(ActionKind::Destroy);
        }
        NodeKind::Actor(ActorKind::Robot) => {
            if let Ok(robot) = stage.world.get::<&Robot>(entity) {
                options.title = robot.name.clone();
            }
        }
        _ => {}
    }

    Some(options)
}
