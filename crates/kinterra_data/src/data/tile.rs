use serde::{Deserialize, Serialize};

/// Mutable per-cell world state. The read-only soil flag lives in the map
/// source, not here.
///
/// `last_harvest` is the day-of-year index at which the crop timer last
/// restarted; growth is always recomputed from it on demand and never
/// materialised on the tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub last_harvest: u16,
    pub stored_food: u16,
    pub stone: u16,
    pub wall_hp: u16,
}
