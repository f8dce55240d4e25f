use crate::agents::AgentTable;
use crate::bitset::Pid;
use crate::calendar::Calendar;
use crate::config::EnvConfig;
use crate::constants::{
    FOOD_CAPACITY, MAX_HP, MAX_SATIATION, METABOLISM_RATE, REPRODUCTION_AGE, STONE_CAPACITY,
};
use crate::kinship::KinshipEngine;
use crate::shared::SharedBuffers;
use crate::systems::stats::EpisodeCounters;
use crate::tiles::{crop_available, TileGrid};
use kinterra_data::{Action, Direction};
use rand::Rng;

/// Moore-8 neighbourhood, row-major, centre excluded. Partner and birth-cell
/// scans walk it in this order.
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// The forward 1x3 arc swept by an attack, for a given facing. The base arc
/// faces up; the others are its clockwise rotations.
#[must_use]
pub fn attack_arc(dir: Direction) -> [(i32, i32); 3] {
    const UP_ARC: [(i32, i32); 3] = [(-1, -1), (-1, 0), (-1, 1)];
    let mut arc = UP_ARC;
    for _ in 0..dir.index() {
        for cell in &mut arc {
            *cell = (cell.1, -cell.0);
        }
    }
    arc
}

/// One tick's action pass over the shuffled alive list.
///
/// Holds mutable borrows of every engine part an action can touch; the
/// shared buffers travel as a call argument, matching their host-owned
/// lifetime. Agents spawned mid-pass become visible to later agents through
/// the alive mask and `pid_at`, but the iteration order is pinned before
/// the pass starts.
pub struct ActionResolver<'a, R: Rng> {
    pub cfg: &'a EnvConfig,
    pub calendar: &'a Calendar,
    pub tiles: &'a mut TileGrid,
    pub agents: &'a mut AgentTable,
    pub kinship: &'a mut KinshipEngine,
    pub counters: &'a mut EpisodeCounters,
    pub rng: &'a mut R,
}

impl<'a, R: Rng> ActionResolver<'a, R> {
    pub fn run(&mut self, order: &[Pid], bufs: &mut SharedBuffers) {
        for &pid in order {
            self.pre_action_update(pid);
            match Action::from_code(bufs.actions[pid]) {
                Action::MoveUp => self.act_move(pid, Direction::Up),
                Action::MoveRight => self.act_move(pid, Direction::Right),
                Action::MoveDown => self.act_move(pid, Direction::Down),
                Action::MoveLeft => self.act_move(pid, Direction::Left),
                Action::Noop => {}
                Action::Pickup => self.act_pickup(pid),
                Action::Mine => self.act_mine(pid),
                Action::Package => self.act_package(pid),
                Action::BuildWall => self.act_build_wall(pid),
                Action::Attack => self.act_attack(pid),
                Action::Reproduce => self.act_reproduce(pid, bufs),
            }
        }
    }

    /// Ageing, metabolism and auto-eating, applied before the agent's own
    /// action. Crossing the maturity age extends and refills the health bar.
    fn pre_action_update(&mut self, pid: Pid) {
        let a = self.agents.agent_mut(pid);
        a.age += 1;
        if a.age == REPRODUCTION_AGE {
            a.hp_max = MAX_HP;
            a.hp = a.hp_max;
        }
        a.satiation -= METABOLISM_RATE;
        if a.food_carried > 0 {
            let deficit = (MAX_SATIATION - a.satiation).max(0) as u16;
            let eaten = deficit.min(a.food_carried);
            a.satiation += eaten as i16;
            a.food_carried -= eaten;
            self.counters.food_eaten += u64::from(eaten);
        }
    }

    /// Movement doubles as turning: the step is only attempted when the
    /// agent already faces the requested direction, and the facing is set
    /// regardless of whether the step succeeded.
    fn act_move(&mut self, pid: Pid, dir: Direction) {
        let (row, col, facing) = {
            let a = self.agents.agent(pid);
            (a.row, a.col, a.dir)
        };
        if facing == dir {
            let (dr, dc) = dir.delta();
            let nr = self.tiles.wrap_row(i32::from(row) + dr);
            let nc = self.tiles.wrap_col(i32::from(col) + dc);
            if !self.tiles.is_blocked(nr, nc) {
                self.tiles.clear_pid(row, col);
                self.tiles.set_pid(nr, nc, pid);
                let a = self.agents.agent_mut(pid);
                a.row = nr;
                a.col = nc;
            }
        }
        self.agents.agent_mut(pid).dir = dir;
    }

    fn act_pickup(&mut self, pid: Pid) {
        let (row, col) = {
            let a = self.agents.agent(pid);
            (a.row, a.col)
        };
        let day = self.calendar.day;
        let winter = self.calendar.is_winter;

        let stored = self.tiles.tile(row, col).stored_food;
        if stored > 0 {
            let a = self.agents.agent_mut(pid);
            let taken = stored.min(FOOD_CAPACITY - a.food_carried);
            a.food_carried += taken;
            self.tiles.tile_mut(row, col).stored_food -= taken;
            let emptied = self.tiles.tile(row, col).stored_food == 0;
            if emptied && !winter && self.tiles.is_soil(row, col) {
                self.tiles.tile_mut(row, col).last_harvest = day as u16;
            }
            return;
        }

        let days = self.tiles.growth_days(row, col, day, winter);
        let crop = crop_available(days);
        // a yieldless timer keeps accruing; only an actual harvest resets it
        if crop > 0 {
            self.tiles.tile_mut(row, col).last_harvest = day as u16;
            let taken = {
                let a = self.agents.agent_mut(pid);
                let taken = crop.min(FOOD_CAPACITY - a.food_carried);
                a.food_carried += taken;
                taken
            };
            let spilled = self.tiles.store_food(row, col, crop - taken);
            self.counters.food_stored += u64::from(spilled);
        }
    }

    /// Mines the first cardinal neighbour holding stone, turning toward it.
    fn act_mine(&mut self, pid: Pid) {
        let (row, col) = {
            let a = self.agents.agent(pid);
            (a.row, a.col)
        };
        for dir in Direction::ALL {
            let (dr, dc) = dir.delta();
            let nr = self.tiles.wrap_row(i32::from(row) + dr);
            let nc = self.tiles.wrap_col(i32::from(col) + dc);
            if self.tiles.tile(nr, nc).stone > 0 {
                self.agents.agent_mut(pid).dir = dir;
                if self.agents.agent(pid).stone_carried < STONE_CAPACITY {
                    self.tiles.tile_mut(nr, nc).stone -= 1;
                    self.agents.agent_mut(pid).stone_carried += 1;
                    self.counters.stone_mined += 1;
                }
                return;
            }
        }
    }

    /// Harvests the own tile into storage, then drops carried food on top.
    fn act_package(&mut self, pid: Pid) {
        let (row, col) = {
            let a = self.agents.agent(pid);
            (a.row, a.col)
        };
        let day = self.calendar.day;
        let winter = self.calendar.is_winter;

        let days = self.tiles.growth_days(row, col, day, winter);
        let crop = crop_available(days);
        if crop > 0 {
            let stored = self.tiles.store_food(row, col, crop);
            self.tiles.tile_mut(row, col).last_harvest = day as u16;
            self.counters.food_stored += u64::from(stored);
        }

        let carried = self.agents.agent(pid).food_carried;
        if carried > 0 {
            let dropped = self.tiles.store_food(row, col, carried);
            self.agents.agent_mut(pid).food_carried -= dropped;
            self.counters.food_stored += u64::from(dropped);
        }
    }

    fn act_build_wall(&mut self, pid: Pid) {
        let (row, col, dir, stone) = {
            let a = self.agents.agent(pid);
            (a.row, a.col, a.dir, a.stone_carried)
        };
        if stone == 0 {
            return;
        }
        let (dr, dc) = dir.delta();
        let nr = self.tiles.wrap_row(i32::from(row) + dr);
        let nc = self.tiles.wrap_col(i32::from(col) + dc);
        if self.tiles.place_wall(nr, nc) {
            self.agents.agent_mut(pid).stone_carried -= 1;
            self.counters.walls_built += 1;
        }
    }

    /// Sweeps the four arcs clockwise from the facing; the first wall or
    /// agent found is struck and the attacker turns that way. An empty sweep
    /// is a no-op.
    fn act_attack(&mut self, pid: Pid) {
        let (row, col, facing) = {
            let a = self.agents.agent(pid);
            (a.row, a.col, a.dir)
        };
        for turn in 0..4 {
            let dir = facing.rotate_cw(turn);
            for (dr, dc) in attack_arc(dir) {
                let tr = self.tiles.wrap_row(i32::from(row) + dr);
                let tc = self.tiles.wrap_col(i32::from(col) + dc);
                if self.tiles.tile(tr, tc).wall_hp > 0 {
                    self.agents.agent_mut(pid).dir = dir;
                    let left = {
                        let t = self.tiles.tile_mut(tr, tc);
                        t.wall_hp -= 1;
                        t.wall_hp
                    };
                    if left == 0 {
                        self.tiles
                            .destroy_wall(tr, tc, self.calendar.day, self.calendar.is_winter);
                        self.counters.walls_destroyed += 1;
                    }
                    return;
                }
                if let Some(victim) = self.tiles.pid_at(tr, tc) {
                    self.agents.agent_mut(pid).dir = dir;
                    self.strike(pid, victim);
                    return;
                }
            }
        }
    }

    /// A downed victim stays on the grid until the death sweep and keeps its
    /// satiation, so later attackers in the same pass can loot it again.
    fn strike(&mut self, attacker: Pid, victim: Pid) {
        let (att, vic) = self.agents.pair_mut(attacker, victim);
        let downed_now = vic.hp == 1;
        vic.hp = vic.hp.saturating_sub(1);
        if vic.hp == 0 {
            if downed_now {
                self.counters.murders += 1;
            }
            att.satiation = (att.satiation + vic.satiation.max(0) / 2).min(MAX_SATIATION);
            let stone = vic.stone_carried.min(STONE_CAPACITY - att.stone_carried);
            att.stone_carried += stone;
            vic.stone_carried -= stone;
            let food = vic.food_carried.min(FOOD_CAPACITY - att.food_carried);
            att.food_carried += food;
            vic.food_carried -= food;
        }
    }

    /// Both partners must have chosen `Reproduce` this tick (judged on the
    /// raw action input) and meet the fitness bar; the child lands on the
    /// first free Moore neighbour. No partner or no free cell means no
    /// birth and no cost.
    fn act_reproduce(&mut self, pid: Pid, bufs: &mut SharedBuffers) {
        let genes = self.cfg.n_genes;
        {
            let a = self.agents.agent(pid);
            if a.age < REPRODUCTION_AGE || a.satiation <= MAX_SATIATION / 2 {
                return;
            }
        }
        if self.agents.alive_count() == self.cfg.max_agents {
            return;
        }
        let (row, col) = {
            let a = self.agents.agent(pid);
            (a.row, a.col)
        };

        let mut partner = None;
        for (dr, dc) in MOORE_OFFSETS {
            let nr = self.tiles.wrap_row(i32::from(row) + dr);
            let nc = self.tiles.wrap_col(i32::from(col) + dc);
            if let Some(q) = self.tiles.pid_at(nr, nc) {
                if Action::from_code(bufs.actions[q]) != Action::Reproduce {
                    continue;
                }
                let b = self.agents.agent(q);
                if b.age >= REPRODUCTION_AGE && b.satiation > MAX_SATIATION / 2 {
                    partner = Some(q);
                    break;
                }
            }
        }
        let Some(partner) = partner else {
            return;
        };

        let mut birth_cell = None;
        for (dr, dc) in MOORE_OFFSETS {
            let nr = self.tiles.wrap_row(i32::from(row) + dr);
            let nc = self.tiles.wrap_col(i32::from(col) + dc);
            if !self.tiles.is_blocked(nr, nc) {
                birth_cell = Some((nr, nc));
                break;
            }
        }
        let Some((br, bc)) = birth_cell else {
            return;
        };

        self.agents.agent_mut(pid).satiation -= MAX_SATIATION / 2;
        self.agents.agent_mut(partner).satiation -= MAX_SATIATION / 2;

        let Some(child) = self
            .agents
            .spawn(br, bc, &mut *self.rng, &mut bufs.alive_mask)
        else {
            return;
        };
        self.tiles.set_pid(br, bc, child);
        for g in 0..genes {
            let source = if self.rng.gen_bool(0.5) { pid } else { partner };
            bufs.dnas[child * genes + g] = bufs.dnas[source * genes + g];
        }
        self.agents.agent_mut(child).role = self.rng.gen_range(0..self.cfg.n_roles);
        self.kinship
            .record_birth(child, &bufs.alive_mask, &bufs.dnas, &mut bufs.kinship);
        self.counters.births += 1;
    }
}
