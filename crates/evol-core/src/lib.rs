//! Core simulation types and the tick engine for Evol: a toroidal grid of
//! autonomous, DNA-driven lifeforms evolving under mutation and selection.

pub mod arena;
pub mod arena_block;
pub mod arena_view;
pub mod asteroid;
pub mod config;
pub mod coord;
pub mod engine;
pub mod json;
pub mod lifeform;
pub mod mutator;
pub mod opcode;
pub mod snapshot;
pub mod timer;

pub use arena::Arena;
pub use arena_block::ArenaBlock;
pub use arena_view::ArenaView;
pub use asteroid::Asteroid;
pub use config::{Config, ConfigError, MutationParams};
pub use coord::{Coord, Unit};
pub use engine::Engine;
pub use json::{LifeformRecord, UnknownMnemonic};
pub use lifeform::Lifeform;
pub use opcode::{ActionKind, OpCode, OPCODE_COUNT};
pub use snapshot::{LifeformSnapshot, SnapshotView};
pub use timer::{Timer, TimerStats};
