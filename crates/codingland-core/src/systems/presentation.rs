//! Presentation snapshot for the rendering collaborator.

use codingland_logic::constants::{CHUNK_SIZE_PX, ENTITY_SCALE};
use codingland_logic::Vector;
use hecs::Entity;

use super::production::miner_is_valid;
use crate::components::*;
use crate::stage::Stage;

/// Everything the renderer needs for one visible node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub entity: Entity,
    pub element_id: String,
    pub mounted_under: Option<String>,
    pub kind: NodeKind,
    pub depth: u32,
    /// Logical position plus cosmetic offsets, in cells.
    pub position: Vector,
    /// Top-left corner in pixels.
    pub screen: (f64, f64),
    /// Edge length in pixels.
    pub size_px: f64,
    pub opacity: f64,
    pub health: Option<Health>,
    pub under_attack: bool,
    /// Buildings that cannot work where they stand.
    pub invalid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Pixel size of the map element.
    pub map_px: (f64, f64),
    pub items: Vec<RenderItem>,
}

/// Map element size: one chunk edge per cell plus a 1px border each side.
pub fn map_pixel_size(size: Vector) -> (f64, f64) {
    let (w, h) = size.extract();
    (CHUNK_SIZE_PX * w + 2.0, CHUNK_SIZE_PX * h + 2.0)
}

fn render_item(stage: &Stage, entity: Entity) -> Option<RenderItem> {
    let presentation = stage.world.get::<&Presentation>(entity).ok()?;
    let kind = stage.kind(entity)?;
    let base = stage.world_position(entity).unwrap_or(Vector::ZERO);
    let position = base + presentation.offset();
    let (x, y) = position.extract();

    let size_px = if kind.is_actor() {
        CHUNK_SIZE_PX * ENTITY_SCALE
    } else {
        CHUNK_SIZE_PX
    };
    let invalid = match kind {
        NodeKind::Building(BuildingKind::ResourceMiner) => !miner_is_valid(stage, entity),
        _ => false,
    };

    Some(RenderItem {
        entity,
        element_id: presentation.element_id.clone(),
        mounted_under: presentation.mounted_under.clone(),
        kind,
        depth: stage.depth(entity).unwrap_or(0),
        position,
        screen: (x * CHUNK_SIZE_PX, y * CHUNK_SIZE_PX),
        size_px,
        opacity: presentation.opacity,
        health: stage.health(entity),
        under_attack: presentation.has(EffectKind::UnderAttack),
        invalid,
    })
}

/// Snapshot of visible nodes under `root` in pre-order, followed by disposed
/// nodes still fading out.
pub fn render_frame(stage: &Stage, root: Entity) -> RenderFrame {
    let map_px = stage
        .map_size(root)
        .map(map_pixel_size)
        .unwrap_or((0.0, 0.0));

    let mut items: Vec<RenderItem> = stage
        .walk(root)
        .into_iter()
        .filter(|&e| stage.is_alive(e))
        .filter_map(|e| render_item(stage, e))
        .collect();

    let fading: Vec<Entity> = stage
        .world
        .query::<(&Node, &Presentation)>()
        .iter()
        .filter(|(_, (node, _))| node.is_disposed())
        .map(|(e, _)| e)
        .collect();
    items.extend(fading.into_iter().filter_map(|e| render_item(stage, e)));

    RenderFrame { map_px, items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prefabs;
    use codingland_logic::constants::{BUILDING_SLOT, ENTITY_MAX_HEALTH};

    #[test]
    fn test_map_pixel_size() {
        assert_eq!(map_pixel_size(Vector::new(8.0, 5.0)), (770.0, 482.0));
    }

    #[test]
    fn test_frame_lists_visible_nodes() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(2.0, 1.0)).unwrap();
        let actor = prefabs::actor(&mut stage, ActorKind::Generic, Vector::new(1.0, 0.0));
        stage.add_child(map, actor).unwrap();

        let frame = render_frame(&stage, map);
        assert_eq!(frame.map_px, (194.0, 98.0));
        assert_eq!(frame.items.len(), 4);
        assert_eq!(frame.items[0].kind, NodeKind::Map);

        let item = frame.items.iter().find(|i| i.entity == actor).unwrap();
        assert_eq!(item.screen, (96.0, 0.0));
        assert_eq!(item.size_px, 48.0);
        assert_eq!(item.depth, 1);
        assert_eq!(item.health.map(|h| h.current), Some(ENTITY_MAX_HEALTH));
    }

    #[test]
    fn test_miner_off_resource_flagged_invalid() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(1.0, 1.0)).unwrap();
        let chunk = stage.children(map)[0];
        let miner = prefabs::miner(&mut stage, 1);
        stage.set_child(chunk, BUILDING_SLOT, miner).unwrap();

        let frame = render_frame(&stage, map);
        let item = frame.items.iter().find(|i| i.entity == miner).unwrap();
        assert!(item.invalid);
        assert_eq!(item.position, Vector::ZERO);
    }

    #[test]
    fn test_disposed_node_renders_while_fading() {
        let mut stage = Stage::new();
        let map = stage.create_map(Vector::new(1.0, 1.0)).unwrap();
        let actor = prefabs::actor(&mut stage, ActorKind::Generic, Vector::ZERO);
        stage.add_child(map, actor).unwrap();
        stage.dispose(actor).unwrap();

        let frame = render_frame(&stage, map);
        let item = frame.items.iter().find(|i| i.entity == actor).unwrap();
        assert_eq!(item.opacity, 0.0);
    }
}
