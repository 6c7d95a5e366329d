//! Scene-tree node component and the closed set of node kinds.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a stage object, unique within one [`Stage`](crate::stage::Stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// DOM-style element id used by the presentation layer.
    pub fn element_id(&self) -> String {
        format!("sgt-object-{:012x}", self.0)
    }

    /// First 12 hex digits, as shown in popup subtitles.
    pub fn short(&self) -> String {
        format!("{:012x}", self.0).chars().take(12).collect()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element_id())
    }
}

/// Where a node is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Constructed, or detached from a disposed parent. No parent.
    Unattached,
    /// Mounted under a parent (or installed as a stage root).
    Attached,
    /// Terminal. The node is waiting to be reaped and cannot be reused.
    Disposed,
}

/// Terrain features living in chunk slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    ResourcePoint,
    Wall,
    Entrance,
    Base,
}

/// Buildings living in chunk slot 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    ResourceMiner,
}

/// Mobile actors living directly under the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Generic,
    Robot,
    EnemyDirectAttacker,
    EnemyEngineer,
}

impl ActorKind {
    pub fn is_enemy(&self) -> bool {
        matches!(self, ActorKind::EnemyDirectAttacker | ActorKind::EnemyEngineer)
    }
}

/// What a node is. Replaces string type tags; behavior dispatch matches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Object,
    Map,
    Chunk,
    Terrain(TerrainKind),
    Building(BuildingKind),
    Actor(ActorKind),
}

impl NodeKind {
    /// Namespaced tag, used as a presentation class name.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Object => "stage.object",
            NodeKind::Map => "codingland.map",
            NodeKind::Chunk => "codingland.map.chunk",
            NodeKind::Terrain(TerrainKind::ResourcePoint) => "codingland.units.resource",
            NodeKind::Terrain(TerrainKind::Wall) => "codingland.units.wall",
            NodeKind::Terrain(TerrainKind::Entrance) => "codingland.units.entrance",
            NodeKind::Terrain(TerrainKind::Base) => "codingland.units.base",
            NodeKind::Building(BuildingKind::ResourceMiner) => "codingland.buildings.miner",
            NodeKind::Actor(ActorKind::Generic) => "codingland.entity",
            NodeKind::Actor(ActorKind::Robot) => "codingland.entities.robot",
            NodeKind::Actor(ActorKind::EnemyDirectAttacker) => "codingland.entities.enemy.direct",
            NodeKind::Actor(ActorKind::EnemyEngineer) => "codingland.entities.enemy.engineer",
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self, NodeKind::Actor(_))
    }

    pub fn is_chunk(&self) -> bool {
        matches!(self, NodeKind::Chunk)
    }

    pub fn terrain(&self) -> Option<TerrainKind> {
        match self {
            NodeKind::Terrain(t) => Some(*t),
            _ => None,
        }
    }

    pub fn building(&self) -> Option<BuildingKind> {
        match self {
            NodeKind::Building(b) => Some(*b),
            _ => None,
        }
    }

    pub fn actor(&self) -> Option<ActorKind> {
        match self {
            NodeKind::Actor(a) => Some(*a),
            _ => None,
        }
    }
}

/// Tree bookkeeping for every stage object.
///
/// `children` is slot-addressed: [`set_child`](crate::stage::Stage::set_child)
/// may leave holes, which read as empty slots. `parent` is a lookup handle
/// only; it never keeps the parent alive.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: ObjectId,
    pub kind: NodeKind,
    pub parent: Option<Entity>,
    pub children: Vec<Option<Entity>>,
    pub depth: u32,
    pub state: Lifecycle,
}

impl Node {
    pub fn new(id: ObjectId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            depth: 0,
            state: Lifecycle::Unattached,
        }
    }

    /// Occupied child slots, in slot order.
    pub fn child_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.children.iter().flatten().copied()
    }

    pub fn is_disposed(&self) -> bool {
        self.state == Lifecycle::Disposed
    }
}
