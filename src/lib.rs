//! kinterra - a deterministic kin-selection grid-world for multi-agent
//! reinforcement learning.
//!
//! The engine lives in [`kinterra_core`]; this crate re-exports the host
//! ABI and ships a small random-policy driver binary.

pub use kinterra_core::{Engine, EnvConfig, SharedBuffers};
pub use kinterra_data::{Action, Agent, Direction, EpisodeStats, Tile};
