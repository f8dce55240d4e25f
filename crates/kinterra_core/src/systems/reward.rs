use crate::agents::AgentTable;
use crate::bitset::Pid;
use crate::config::EnvConfig;
use crate::kinship::KinshipEngine;
use crate::shared::SharedBuffers;
use crate::systems::stats::EpisodeCounters;
use crate::tiles::TileGrid;

/// Recycles every alive slot whose satiation or health ran out this tick.
///
/// The victims' kinship rows and records are left untouched; the reward
/// pass still needs them to attribute a final reward. `dead` receives the
/// terminated pids for that pass.
pub fn death_sweep(
    agents: &mut AgentTable,
    tiles: &mut TileGrid,
    counters: &mut EpisodeCounters,
    bufs: &mut SharedBuffers,
    dead: &mut Vec<Pid>,
) {
    dead.clear();
    for i in 0..agents.alive_pids().len() {
        let pid = agents.alive_pids()[i];
        let a = *agents.agent(pid);
        if a.satiation > 0 && a.hp > 0 {
            continue;
        }
        tiles.clear_pid(a.row, a.col);
        bufs.terminals[pid] = 1;
        counters.record_death(a.age, a.satiation <= 0);
        agents.kill(pid, &mut bufs.alive_mask);
        dead.push(pid);
    }
}

/// Writes rewards for every slot alive or terminated this tick, then rolls
/// the family sizes into the previous-tick baseline.
///
/// Delta mode pays family growth normalised by gene count; growth-rate mode
/// pays the log of the family ratio and, when a slot's whole kin line died
/// out with it, the extinction penalty.
pub fn compute_rewards(
    kinship: &mut KinshipEngine,
    agents: &AgentTable,
    dead: &[Pid],
    cfg: &EnvConfig,
    counters: &mut EpisodeCounters,
    bufs: &mut SharedBuffers,
) {
    kinship.compute_family_sizes(agents.alive_pids(), agents.alive_pids(), &bufs.kinship);
    kinship.compute_family_sizes(dead, agents.alive_pids(), &bufs.kinship);

    let mut write = |kinship: &KinshipEngine, pid: Pid| {
        let family = kinship.family_size(pid);
        let prev = kinship.prev_family_size(pid);
        let reward = if cfg.reward_growth_rate {
            if family > 0 {
                (f64::from(family) / f64::from(prev.max(1))).ln() as f32
            } else {
                let tail = if prev > 1 {
                    (1.0 / f64::from(prev)).ln() as f32
                } else {
                    0.0
                };
                cfg.extinction_reward + tail
            }
        } else {
            (f64::from(family) - f64::from(prev)) as f32 / cfg.n_genes.max(1) as f32
        };
        bufs.rewards[pid] = reward;
        counters.total_reward += f64::from(reward);
    };

    for &pid in agents.alive_pids() {
        write(kinship, pid);
    }
    for &pid in dead {
        write(kinship, pid);
    }
    kinship.commit_family_sizes(agents.alive_pids());
    kinship.commit_family_sizes(dead);
}
