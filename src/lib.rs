//! catradar: data-parallel neighbor-state simulation engine.
//!
//! Up to several million agents move on a rectangular field under a
//! selectable movement pattern; each tick rebuilds a uniform-grid spatial
//! index and reclassifies every agent's interaction state against its
//! neighbors. See [`Engine`] for the tick-driven entry point.

pub mod border;
pub mod classify;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod integrate;
pub mod movement;
pub mod observer;
pub mod types;

pub use crate::engine::{Engine, EngineConfig, EngineStats, EngineTiming, TickInput};
pub use crate::error::{BorderError, ConfigError};
pub use crate::types::*;
