//! Engine and map configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a valid
//! configuration.

use codingland_logic::constants::{
    DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, ENEMY_STEP_INTERVAL, RESOURCE_THRESHOLD, RESOURCE_WOOD,
    TICK_INTERVAL_MS, WALL_THRESHOLD,
};
use codingland_logic::production::ROBOT_BATTERY_CAPACITY;
use serde::{Deserialize, Serialize};

/// Map size and terrain generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    /// Scatter walls and resources, then place the entrance and base.
    pub generate_terrain: bool,
    /// A roll above this places a wall.
    pub wall_threshold: f64,
    /// For non-wall cells, a roll above this places a resource point.
    pub resource_threshold: f64,
    /// Resource id given to generated resource points.
    pub resource: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
            generate_terrain: true,
            wall_threshold: WALL_THRESHOLD,
            resource_threshold: RESOURCE_THRESHOLD,
            resource: RESOURCE_WOOD.to_string(),
        }
    }
}

impl MapConfig {
    /// An empty map of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            generate_terrain: false,
            ..Default::default()
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub map: MapConfig,
    /// Wall-clock length of one tick, used to age cosmetic effects.
    pub tick_interval_ms: u64,
    pub robot_battery: u32,
    /// Ticks between enemy steps.
    pub enemy_step_interval: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Run path searches immediately instead of on the next tick.
    pub inline_search: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            tick_interval_ms: TICK_INTERVAL_MS,
            robot_battery: ROBOT_BATTERY_CAPACITY,
            enemy_step_interval: ENEMY_STEP_INTERVAL,
            seed: None,
            inline_search: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_map(mut self, map: MapConfig) -> Self {
        self.map = map;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.map.width, 8);
        assert_eq!(config.map.height, 5);
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.robot_battery, 1600);
        assert_eq!(config.map.resource, "codingland.wood");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"seed": 7, "map": {"width": 3}}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.map.width, 3);
        assert_eq!(config.map.height, 5);
        assert!(config.map.generate_terrain);
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default().with_seed(42).with_map(MapConfig::blank(4, 4));
        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
