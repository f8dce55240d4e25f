use crate::agents::AgentTable;
use crate::calendar::Calendar;
use crate::config::EnvConfig;
use crate::constants::{
    FOOD_CAPACITY, MAX_GROWTH_DAYS, MAX_HP, STONE_CAPACITY, STONE_PER_MINE, STORAGE_CAPACITY,
    VISION_RADIUS, WALL_HP_MAX, YEAR_LENGTH,
};
use crate::kinship::KinshipEngine;
use crate::shared::SharedBuffers;
use crate::tiles::TileGrid;

/// Linear byte quantisation of `x` from `[lo, hi]` onto `[0, 255]`.
#[must_use]
pub fn quantize(x: f32, lo: f32, hi: f32) -> u8 {
    (((x.clamp(lo, hi) - lo) / (hi - lo)) * 255.0).round() as u8
}

/// Fills the observation bytes of every alive agent.
///
/// Layout per agent: the (2V+1)^2 vision window row-major (five tile bytes,
/// then the occupant block of 6 + n_genes bytes, zeros when the cell is
/// empty), the self block, and the world summary. Dead slots keep their
/// previous contents; the whole buffer is zeroed at reset.
pub fn write_observations(
    cfg: &EnvConfig,
    calendar: &Calendar,
    tiles: &TileGrid,
    agents: &AgentTable,
    kinship: &KinshipEngine,
    bufs: &mut SharedBuffers,
) {
    let genes = cfg.n_genes;
    let n = cfg.max_agents;
    let obs_size = cfg.obs_size();
    let v = VISION_RADIUS as i32;
    let gene_norm = genes.max(1) as f32;

    for &pid in agents.alive_pids() {
        let me = *agents.agent(pid);
        let obs = &mut bufs.observations[pid * obs_size..(pid + 1) * obs_size];
        let mut k = 0;

        for dr in -v..=v {
            for dc in -v..=v {
                let row = tiles.wrap_row(i32::from(me.row) + dr);
                let col = tiles.wrap_col(i32::from(me.col) + dc);
                let t = tiles.tile(row, col);
                obs[k] = u8::from(tiles.is_soil(row, col));
                obs[k + 1] = tiles
                    .growth_days(row, col, calendar.day, calendar.is_winter)
                    .min(MAX_GROWTH_DAYS) as u8;
                obs[k + 2] = quantize(f32::from(t.stored_food), 0.0, f32::from(STORAGE_CAPACITY));
                obs[k + 3] = quantize(f32::from(t.stone), 0.0, f32::from(STONE_PER_MINE));
                obs[k + 4] = quantize(f32::from(t.wall_hp), 0.0, f32::from(WALL_HP_MAX));
                k += 5;

                if let Some(q) = tiles.pid_at(row, col) {
                    let other = agents.agent(q);
                    let kin = f32::from(bufs.kinship[pid * n + q]) / gene_norm;
                    obs[k] = quantize(kin, 0.0, 1.0);
                    obs[k + 1] = quantize(f32::from(other.hp), 0.0, f32::from(MAX_HP));
                    obs[k + 2] = quantize(other.age.min(100) as f32, 0.0, 100.0);
                    obs[k + 3] = quantize(f32::from(other.satiation), 0.0, 100.0);
                    obs[k + 4] = other.dir.index() as u8 + 1;
                    obs[k + 5] = other.role + 1;
                    for g in 0..genes {
                        obs[k + 6 + g] = bufs.dnas[q * genes + g] + 1;
                    }
                } else {
                    obs[k..k + 6 + genes].fill(0);
                }
                k += 6 + genes;
            }
        }

        obs[k] = quantize(f32::from(me.food_carried), 0.0, f32::from(FOOD_CAPACITY));
        obs[k + 1] = quantize(f32::from(me.stone_carried), 0.0, f32::from(STONE_CAPACITY));
        obs[k + 2] = quantize(f32::from(me.hp), 0.0, f32::from(MAX_HP));
        obs[k + 3] = quantize(f32::from(me.satiation), 0.0, 100.0);
        obs[k + 4] = quantize(me.age.min(100) as f32, 0.0, 100.0);
        obs[k + 5] = me.role;
        k += 6;
        for g in 0..genes {
            obs[k + g] = bufs.dnas[pid * genes + g];
        }
        k += genes;

        obs[k] = quantize(f32::from(me.row), 0.0, f32::from(tiles.height()));
        obs[k + 1] = quantize(f32::from(me.col), 0.0, f32::from(tiles.width()));
        obs[k + 2] = quantize(calendar.day as f32, 0.0, YEAR_LENGTH as f32);
        obs[k + 3] = quantize(kinship.family_size(pid) as f32, 0.0, n as f32);
        obs[k + 4] = quantize(agents.alive_count() as f32, 0.0, n as f32);
    }
}
