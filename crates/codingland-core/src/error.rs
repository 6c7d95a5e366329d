//! Error types for stage operations and path requests.

use codingland_logic::Vector;
use hecs::Entity;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("node {0:?} does not exist")]
    MissingNode(Entity),
    #[error("node {0:?} has been disposed")]
    Disposed(Entity),
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("node {0:?} is not placed on a map")]
    NotOnMap(Entity),
    #[error("no chunk at {0}")]
    OutOfBounds(Vector),
    #[error("cannot attach {child:?} under {parent:?}: it is an ancestor")]
    Cycle { parent: Entity, child: Entity },
    #[error("slot {slot} of {chunk:?} is already occupied")]
    SlotOccupied { chunk: Entity, slot: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("path request was cancelled")]
    Cancelled,
    #[error(transparent)]
    Stage(#[from] StageError),
}
