//! CodingLand Core - stage engine for a grid tower-defense game
//!
//! The stage is a scene tree of nodes (maps, chunks, terrain, buildings and
//! mobile actors) stored in a `hecs` world and addressed by entity handles.
//! A tick driver walks the tree once per tick: miners count down and
//! produce resources, robots drain their batteries, enemies path toward the
//! base, and cosmetic effects age out.
//!
//! # Architecture
//!
//! - **Stage**: node arena with parent/child slots, depth and lifecycle
//! - **Components**: pure data attached to nodes (Transform, Attributes, Miner, ...)
//! - **Systems**: logic over nodes (movement, production, pursuit, ...)
//! - **Engine**: owns the stage, event bus, inventory and path scheduler
//!
//! # Example
//!
//! ```rust,no_run
//! use codingland_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(EngineConfig::default());
//! engine.generate().expect("map");
//!
//! loop {
//!     engine.update(); // one tick, every 100 ms
//! }
//! ```

pub mod actions;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod inventory;
pub mod map;
pub mod persistence;
pub mod stage;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{EngineConfig, MapConfig};
    pub use crate::engine::{RobotTask, SimulationEngine};
    pub use crate::error::{PathError, StageError};
    pub use crate::events::{Channel, EventBus, Message, StageEvent};
    pub use crate::stage::Stage;
    pub use codingland_logic::{Direction, Vector};
}
