//! # Kinterra Core
//!
//! The deterministic tick engine for kinterra - a kin-selection grid-world
//! used as a multi-agent reinforcement-learning environment.
//!
//! This crate contains the full simulation logic, including:
//! - A fixed-capacity agent slot table with free-list recycling
//! - Toroidal tile grid (crops, stored food, stone deposits, walls)
//! - Kinship matrix maintenance and family-size rewards
//! - The 11-action resolver and reproduction protocol
//! - Byte-quantised observation tensors for external policies
//!
//! ## Architecture
//!
//! The engine is single-threaded and fully synchronous. One `step` call is
//! indivisible from the host's perspective; all randomness flows through a
//! single seeded RNG stream so that equal seeds replay byte-identical
//! episodes. Host-visible arrays (observations, actions, rewards, terminals,
//! alive mask, kinship matrix, DNA pool) live in [`SharedBuffers`], owned by
//! the host and borrowed by the engine per call.
//!
//! ## Example
//!
//! ```ignore
//! use kinterra_core::{Engine, EnvConfig, SharedBuffers};
//!
//! let config = EnvConfig::default();
//! let mut buffers = SharedBuffers::new(&config);
//! let mut engine = Engine::new(config)?;
//! engine.reset(&mut buffers)?;
//! engine.step(&mut buffers)?;
//! ```

/// Fixed-capacity agent table and slot allocator
pub mod agents;
/// Fixed-capacity identifier set with word-level enumeration
pub mod bitset;
/// Day counter and summer/winter cycle
pub mod calendar;
/// Configuration management for environment parameters
pub mod config;
/// Engine-wide tuning constants
pub mod constants;
/// Tick driver: reset/step/render/close
pub mod engine;
/// Per-episode statistics logging
pub mod history;
/// Kinship matrix and family-size bookkeeping
pub mod kinship;
/// Host-owned buffer block shared with external policies
pub mod shared;
/// Read-only soil bitmap source
pub mod soil;
/// Action resolver, death sweep, rewards, observations
pub mod systems;
/// Toroidal tile grid with crops, stones and walls
pub mod tiles;

pub use config::EnvConfig;
pub use engine::Engine;
pub use shared::SharedBuffers;
pub use kinterra_data::{Action, Agent, Direction, EpisodeStats, Tile};
