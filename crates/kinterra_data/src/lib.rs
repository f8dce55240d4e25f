//! Pure data structures for the kinterra simulation.
//!
//! This crate contains serializable data types with no business logic,
//! shared between the tick engine and any host-side tooling.

pub mod data;

pub use data::action::*;
pub use data::agent::*;
pub use data::stats::*;
pub use data::tile::*;
