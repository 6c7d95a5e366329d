//! Pure stage logic for CodingLand.
//!
//! Everything here is independent of the node arena and the tick driver:
//! functions take plain data and return results, so they are unit-testable
//! on their own and shared by the engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Chunk size, tick interval, slot indices, effect timings |
//! | [`pathfinding`] | Four-way BFS to the nearest of several target cells |
//! | [`production`] | Miner output/cycle rules, robot battery drain |
//! | [`queue`] | FIFO work queue |
//! | [`vector`] | Optional-component 2D vectors and grid directions |

pub mod constants;
pub mod pathfinding;
pub mod production;
pub mod queue;
pub mod vector;

pub use vector::{Direction, Vector};
