use crate::constants::{STARTING_DAY, SUMMER_DURATION, YEAR_LENGTH};
use serde::{Deserialize, Serialize};

/// Day-of-year counter driving the summer/winter cycle.
///
/// The day is a pure function of the tick counter; `advance` also tracks the
/// winter flag edge so the tick driver can restart crop timers exactly once
/// per summer return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub day: u32,
    pub is_winter: bool,
}

impl Default for Calendar {
    fn default() -> Self {
        let day = STARTING_DAY % YEAR_LENGTH;
        Self {
            day,
            is_winter: day >= SUMMER_DURATION,
        }
    }
}

impl Calendar {
    /// Recomputes the day from the tick counter. Returns `true` on the edge
    /// where winter just ended.
    pub fn advance(&mut self, tick: u64) -> bool {
        self.day = ((tick + u64::from(STARTING_DAY)) % u64::from(YEAR_LENGTH)) as u32;
        let winter = self.day >= SUMMER_DURATION;
        let summer_returned = self.is_winter && !winter;
        self.is_winter = winter;
        summer_returned
    }

    #[must_use]
    pub fn is_summer(&self) -> bool {
        !self.is_winter
    }
}
