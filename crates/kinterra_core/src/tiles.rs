use crate::bitset::Pid;
use crate::constants::{
    GROWTH_RATE, MAX_GROWTH_DAYS, STONE_PER_MINE, STORAGE_CAPACITY, WALL_HP_MAX,
};
use crate::soil::SoilMap;
use kinterra_data::Tile;

/// Toroidal wrap of a possibly-negative coordinate into `[0, n)`.
#[inline]
#[must_use]
pub fn wrap(v: i32, n: u16) -> u16 {
    let n = i32::from(n);
    (((v % n) + n) % n) as u16
}

/// Yield of a crop timer after `days` growth days, saturating at the cap.
#[must_use]
pub fn crop_available(days: u16) -> u16 {
    let days = days.min(MAX_GROWTH_DAYS);
    ((GROWTH_RATE * f64::from(days)).exp() - 1.0).floor() as u16
}

/// Flat row-major tile store plus the `pid_at` spatial index.
///
/// Every mutation that touches occupancy goes through `set_pid`/`clear_pid`
/// so the index never disagrees with the agent table.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
    soil: SoilMap,
    pid_at: Vec<Option<Pid>>,
}

impl TileGrid {
    #[must_use]
    pub fn new(soil: SoilMap) -> Self {
        let (width, height) = (soil.width(), soil.height());
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::default(); cells],
            soil,
            pid_at: vec![None; cells],
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn idx(&self, row: u16, col: u16) -> usize {
        row as usize * self.width as usize + col as usize
    }

    #[must_use]
    pub fn wrap_row(&self, row: i32) -> u16 {
        wrap(row, self.height)
    }

    #[must_use]
    pub fn wrap_col(&self, col: i32) -> u16 {
        wrap(col, self.width)
    }

    #[must_use]
    pub fn tile(&self, row: u16, col: u16) -> &Tile {
        &self.tiles[self.idx(row, col)]
    }

    pub fn tile_mut(&mut self, row: u16, col: u16) -> &mut Tile {
        let idx = self.idx(row, col);
        &mut self.tiles[idx]
    }

    #[must_use]
    pub fn is_soil(&self, row: u16, col: u16) -> bool {
        self.soil.is_soil(row, col)
    }

    #[must_use]
    pub fn pid_at(&self, row: u16, col: u16) -> Option<Pid> {
        self.pid_at[self.idx(row, col)]
    }

    pub fn set_pid(&mut self, row: u16, col: u16, pid: Pid) {
        let idx = self.idx(row, col);
        self.pid_at[idx] = Some(pid);
    }

    pub fn clear_pid(&mut self, row: u16, col: u16) {
        let idx = self.idx(row, col);
        self.pid_at[idx] = None;
    }

    /// A cell is blocked when it holds a wall, a stone deposit, or an agent.
    #[must_use]
    pub fn is_blocked(&self, row: u16, col: u16) -> bool {
        let idx = self.idx(row, col);
        let t = &self.tiles[idx];
        t.wall_hp > 0 || t.stone > 0 || self.pid_at[idx].is_some()
    }

    /// Growth days accrued by the crop timer on this cell, zero unless the
    /// cell is soil, it is summer, and the cell carries no stored food,
    /// stone or wall. Occupancy does not stop growth.
    #[must_use]
    pub fn growth_days(&self, row: u16, col: u16, day: u32, is_winter: bool) -> u16 {
        if is_winter || !self.is_soil(row, col) {
            return 0;
        }
        let t = self.tile(row, col);
        if t.stored_food > 0 || t.stone > 0 || t.wall_hp > 0 {
            return 0;
        }
        (day.saturating_sub(u32::from(t.last_harvest)) as u16).min(MAX_GROWTH_DAYS)
    }

    /// Places a wall on an unblocked cell, wiping its resources. Returns
    /// whether the wall went up.
    pub fn place_wall(&mut self, row: u16, col: u16) -> bool {
        if self.is_blocked(row, col) {
            return false;
        }
        let t = self.tile_mut(row, col);
        t.stored_food = 0;
        t.stone = 0;
        t.wall_hp = WALL_HP_MAX;
        true
    }

    /// Clears a wall; in summer on soil the crop timer restarts at `day` so
    /// growth resumes immediately.
    pub fn destroy_wall(&mut self, row: u16, col: u16, day: u32, is_winter: bool) {
        let soil = self.is_soil(row, col);
        let t = self.tile_mut(row, col);
        t.wall_hp = 0;
        if !is_winter && soil {
            t.last_harvest = day as u16;
        }
    }

    /// Adds `amount` to the cell's stored food, saturating at the tile cap.
    /// Returns how much was actually stored.
    pub fn store_food(&mut self, row: u16, col: u16, amount: u16) -> u16 {
        let t = self.tile_mut(row, col);
        let stored = amount.min(STORAGE_CAPACITY - t.stored_food);
        t.stored_food += stored;
        stored
    }

    /// Seeds the five stone deposits: one per quadrant anchor plus the
    /// centre, each holding a full mine.
    pub fn place_stone_deposits(&mut self) {
        const ANCHORS: [(f64, f64); 5] = [
            (0.25, 0.25),
            (0.25, 0.75),
            (0.75, 0.25),
            (0.75, 0.75),
            (0.50, 0.50),
        ];
        for (fr, fc) in ANCHORS {
            let row = (fr * f64::from(self.height)) as u16;
            let col = (fc * f64::from(self.width)) as u16;
            self.tile_mut(row, col).stone = STONE_PER_MINE;
        }
    }

    /// Restarts every soil cell's crop timer; called on the summer return.
    pub fn reset_harvest_timers(&mut self) {
        for row in 0..self.height {
            for col in 0..self.width {
                if self.soil.is_soil(row, col) {
                    let idx = self.idx(row, col);
                    self.tiles[idx].last_harvest = 0;
                }
            }
        }
    }

    /// Episode reset: zero all tile props and evict every occupant.
    pub fn reset(&mut self) {
        self.tiles.fill(Tile::default());
        self.pid_at.fill(None);
    }
}
