use thiserror::Error;

use crate::geom::Rect;
use crate::types::NodeId;

/// Fatal level-construction failures. A generator never hands out a partially wired level.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    #[error("{layout} needs a larger region than {width}x{height}")]
    RegionTooSmall { layout: &'static str, width: usize, height: usize },
    #[error("could not place the {role} room at {rect:?}")]
    RoomPlacement { role: &'static str, rect: Rect },
    #[error("no corridor path between nodes {from:?} and {to:?}")]
    CorridorUnreachable { from: NodeId, to: NodeId },
    #[error("generated level has no entry room")]
    MissingEntry,
    #[error("generated level has no exit room")]
    MissingExit,
    #[error("generated level has {count} entry rooms")]
    DuplicateEntry { count: usize },
    #[error("generated level has {count} exit rooms")]
    DuplicateExit { count: usize },
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),
}
