use super::action::Direction;
use serde::{Deserialize, Serialize};

/// One slot of the fixed-capacity agent table.
///
/// The record exists for every slot, dead or alive; liveness is tracked by
/// the slot manager, never by the record itself. `satiation` and `hp` may go
/// non-positive transiently inside a tick; the death sweep recycles such
/// slots before the tick ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub row: u16,
    pub col: u16,
    pub dir: Direction,
    pub hp: u8,
    pub hp_max: u8,
    pub satiation: i16,
    pub age: u32,
    pub food_carried: u16,
    pub stone_carried: u16,
    pub role: u8,
}
