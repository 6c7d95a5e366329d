//! Common components shared by most stage objects.

use codingland_logic::Vector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position and facing of a node.
///
/// Chunks and actors carry map coordinates. Occupants of a chunk leave
/// `position` empty and inherit the chunk's cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector,
    pub direction: Vector,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector::NULL,
            direction: Vector::ZERO,
        }
    }
}

impl Transform {
    pub fn at(position: Vector) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Allegiance of a unit or actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Player,
    Enemy,
    Neutral,
}

/// Named flags attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// `Some(false)` blocks movement into the chunk holding this occupant.
    pub passable: Option<bool>,
    /// Invincible actors are never disposed for running out of health.
    pub invincible: bool,
    pub party: Option<Party>,
    /// Free-form flags for collaborators.
    pub flags: BTreeMap<String, bool>,
}

impl Attributes {
    pub fn impassable() -> Self {
        Self {
            passable: Some(false),
            ..Default::default()
        }
    }

    pub fn with_party(party: Party) -> Self {
        Self {
            party: Some(party),
            ..Default::default()
        }
    }

    /// Passable unless explicitly marked otherwise.
    pub fn is_passable(&self) -> bool {
        self.passable != Some(false)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }
}

/// Hit points of actors and buildings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f64,
    pub max: f64,
}

impl Health {
    pub fn full(max: f64) -> Self {
        Self { current: max, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f64 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }
}

/// Marks a map cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Tile mass in kilograms.
    pub mass: f64,
}

/// Fixed grid dimensions of a map root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapGrid {
    pub size: Vector,
}

impl MapGrid {
    pub fn width(&self) -> u32 {
        self.size.extract().0.max(0.0) as u32
    }

    pub fn height(&self) -> u32 {
        self.size.extract().1.max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passable_defaults_true() {
        assert!(Attributes::default().is_passable());
        assert!(Attributes { passable: Some(true), ..Default::default() }.is_passable());
        assert!(!Attributes::impassable().is_passable());
    }

    #[test]
    fn test_flags() {
        let mut attrs = Attributes::with_party(Party::Player);
        assert!(!attrs.flag("established"));
        attrs.set_flag("established", true);
        assert!(attrs.flag("established"));
        assert_eq!(attrs.party, Some(Party::Player));
    }

    #[test]
    fn test_health() {
        let mut health = Health::full(20.0);
        assert_eq!(health.fraction(), 1.0);
        health.current = -3.0;
        assert!(health.is_depleted());
        assert_eq!(health.fraction(), 0.0);
    }
}
