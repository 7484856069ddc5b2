pub mod action;
pub mod geom;
pub mod grid;
pub mod level;
pub mod mapgen;
pub mod occupant;
pub mod pathing;
pub mod planner;
pub mod scheduler;
pub mod status;
pub mod types;
pub mod visibility;

#[cfg(test)]
mod test_support;

pub use action::{Action, ActionKind};
pub use level::Level;
pub use mapgen::{
    GenerationError, Generator, GeneratorConfig, LevelMap, RoomLayout, ScatteredLayout,
    ThreeRoomsLayout, generate_level,
};
pub use occupant::Occupant;
pub use scheduler::{TurnQueue, TurnWorld};
pub use types::*;
pub use visibility::compute_fov;
