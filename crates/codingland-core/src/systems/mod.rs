//! Systems - logic that operates on stage nodes

mod battery;
mod entity;
mod movement;
mod pathfinding;
mod presentation;
mod production;
mod pursuit;

pub use battery::*;
pub use entity::*;
pub use movement::*;
pub use pathfinding::*;
pub use presentation::*;
pub use production::*;
pub use pursuit::*;
