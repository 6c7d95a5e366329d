//! Component definitions for the stage.
//!
//! Components are pure data attached to stage objects in the node arena.
//! Behavior lives in systems and in the stage/engine operations.

mod common;
mod node;
mod presentation;
mod units;

pub use common::*;
pub use node::*;
pub use presentation::*;
pub use units::*;
