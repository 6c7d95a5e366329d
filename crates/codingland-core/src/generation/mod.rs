//! Generation - prefabs and procedural map creation.

mod map;
pub mod prefabs;

pub use map::*;
