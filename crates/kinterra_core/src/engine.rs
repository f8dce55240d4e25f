use crate::agents::AgentTable;
use crate::bitset::Pid;
use crate::calendar::Calendar;
use crate::config::EnvConfig;
use crate::constants::INITIAL_PAIRS;
use crate::history::EpisodeLogger;
use crate::kinship::KinshipEngine;
use crate::shared::SharedBuffers;
use crate::soil::SoilMap;
use crate::systems::action::{ActionResolver, MOORE_OFFSETS};
use crate::systems::stats::{genetic_diversity, EpisodeCounters};
use crate::systems::{observation, reward};
use crate::tiles::TileGrid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// The tick driver: owns all engine state and advances the world one tick
/// per `step` call.
///
/// Everything stochastic - shuffle order, seeding positions and DNA,
/// inheritance, child roles, initial facings, episode budgets - draws from
/// the single `rng` stream, so a fixed seed replays an episode byte for
/// byte. Host-visible arrays are borrowed per call via [`SharedBuffers`]
/// and never stored here.
pub struct Engine {
    cfg: EnvConfig,
    calendar: Calendar,
    tiles: TileGrid,
    agents: AgentTable,
    kinship: KinshipEngine,
    counters: EpisodeCounters,
    logger: EpisodeLogger,
    rng: ChaCha8Rng,
    tick: u64,
    episode_budget: u64,
    episodes_completed: u64,
    turn_order: Vec<Pid>,
    terminated: Vec<Pid>,
}

impl Engine {
    /// Validates the config, loads the soil map and allocates owned state.
    /// All capacities are fixed here; the hot path never allocates.
    pub fn new(cfg: EnvConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        let soil = match &cfg.map_name {
            Some(name) => SoilMap::load(Path::new(name), cfg.width, cfg.height)?,
            None => SoilMap::all_soil(cfg.width, cfg.height),
        };
        let logger = match &cfg.log_dir {
            Some(dir) => EpisodeLogger::new_at(dir)?,
            None => EpisodeLogger::new_dummy(),
        };
        let rng = ChaCha8Rng::seed_from_u64(cfg.seed.unwrap_or(0));
        Ok(Self {
            calendar: Calendar::default(),
            tiles: TileGrid::new(soil),
            agents: AgentTable::new(cfg.max_agents),
            kinship: KinshipEngine::new(cfg.max_agents, cfg.n_genes),
            counters: EpisodeCounters::default(),
            logger,
            rng,
            tick: 0,
            episode_budget: 0,
            episodes_completed: 0,
            turn_order: Vec::with_capacity(cfg.max_agents),
            terminated: Vec::with_capacity(cfg.max_agents),
            cfg,
        })
    }

    /// Begins a new episode. On return the buffers hold tick-0 observations
    /// and rewards.
    pub fn reset(&mut self, bufs: &mut SharedBuffers) -> anyhow::Result<()> {
        bufs.validate(&self.cfg)?;

        self.tick = 0;
        self.calendar = Calendar::default();
        self.tiles.reset();
        self.tiles.place_stone_deposits();
        self.agents.reset();
        self.kinship.reset(&mut bufs.kinship);
        bufs.observations.fill(0);
        bufs.rewards.fill(0.0);
        bufs.terminals.fill(0);
        bufs.truncations.fill(0);
        bufs.alive_mask.fill(0);

        self.episode_budget = self
            .rng
            .gen_range(self.cfg.min_ep_length..self.cfg.max_ep_length);
        self.seed_population(bufs);
        self.agents.refresh_alive_list();
        self.counters = EpisodeCounters::begin(self.agents.alive_count());
        self.terminated.clear();

        reward::compute_rewards(
            &mut self.kinship,
            &self.agents,
            &self.terminated,
            &self.cfg,
            &mut self.counters,
            bufs,
        );
        observation::write_observations(
            &self.cfg,
            &self.calendar,
            &self.tiles,
            &self.agents,
            &self.kinship,
            bufs,
        );
        Ok(())
    }

    /// Advances exactly one tick, or rolls the episode over when an end
    /// condition triggered at the top of the call.
    pub fn step(&mut self, bufs: &mut SharedBuffers) -> anyhow::Result<()> {
        bufs.terminals.fill(0);
        bufs.truncations.fill(0);

        if self.agents.alive_count() == 0 || self.tick >= self.episode_budget {
            return self.finish_episode(bufs);
        }

        if self.calendar.advance(self.tick) {
            self.tiles.reset_harvest_timers();
        }
        self.tick += 1;
        if self.tick < self.cfg.min_ep_length {
            self.counters.sample_population(self.agents.alive_count());
        }

        self.agents.shuffle_alive(&mut self.rng);
        let mut order = std::mem::take(&mut self.turn_order);
        order.clear();
        order.extend_from_slice(self.agents.alive_pids());
        let mut resolver = ActionResolver {
            cfg: &self.cfg,
            calendar: &self.calendar,
            tiles: &mut self.tiles,
            agents: &mut self.agents,
            kinship: &mut self.kinship,
            counters: &mut self.counters,
            rng: &mut self.rng,
        };
        resolver.run(&order, bufs);
        self.turn_order = order;

        self.agents.refresh_alive_list();
        let mut dead = std::mem::take(&mut self.terminated);
        reward::death_sweep(
            &mut self.agents,
            &mut self.tiles,
            &mut self.counters,
            bufs,
            &mut dead,
        );
        self.terminated = dead;
        self.agents.refresh_alive_list();

        if self.tick >= self.episode_budget {
            bufs.truncations.fill(1);
        }

        reward::compute_rewards(
            &mut self.kinship,
            &self.agents,
            &self.terminated,
            &self.cfg,
            &mut self.counters,
            bufs,
        );
        observation::write_observations(
            &self.cfg,
            &self.calendar,
            &self.tiles,
            &self.agents,
            &self.kinship,
            bufs,
        );
        Ok(())
    }

    /// Optional host hook; rendering lives outside the engine.
    #[must_use]
    pub fn render(&self) -> i32 {
        0
    }

    /// Releases owned state. Dropping the engine is equivalent.
    pub fn close(self) {
        tracing::info!(
            episodes = self.episodes_completed,
            "Environment closed"
        );
    }

    fn finish_episode(&mut self, bufs: &mut SharedBuffers) -> anyhow::Result<()> {
        let diversity = genetic_diversity(
            self.agents.alive_pids(),
            &bufs.dnas,
            self.cfg.n_genes,
            usize::from(self.cfg.n_alleles),
        );
        let stats = self
            .counters
            .finalize(self.tick, self.episodes_completed, diversity);
        tracing::info!(
            episode = stats.n,
            length = stats.episode_length,
            births = stats.births,
            starvations = stats.starvations,
            murders = stats.murders,
            avg_population = stats.avg_population,
            total_reward = stats.total_reward,
            genetic_diversity = stats.genetic_diversity,
            "Episode finished"
        );
        self.logger.log(&stats)?;
        self.episodes_completed += 1;
        self.reset(bufs)
    }

    /// Seeds the breeding pairs: each pair shares one random DNA vector and
    /// lands on a random free cell with the partner adjacent.
    fn seed_population(&mut self, bufs: &mut SharedBuffers) {
        let genes = self.cfg.n_genes;
        for _ in 0..INITIAL_PAIRS {
            let Some((row, col)) = self.random_free_cell() else {
                continue;
            };
            let Some(first) = self
                .agents
                .spawn(row, col, &mut self.rng, &mut bufs.alive_mask)
            else {
                break;
            };
            self.tiles.set_pid(row, col, first);
            for g in 0..genes {
                bufs.dnas[first * genes + g] = self.rng.gen_range(0..self.cfg.n_alleles);
            }
            self.agents.agent_mut(first).role = self.rng.gen_range(0..self.cfg.n_roles);
            self.kinship
                .record_birth(first, &bufs.alive_mask, &bufs.dnas, &mut bufs.kinship);

            let Some((prow, pcol)) = self.adjacent_free_cell(row, col) else {
                continue;
            };
            let Some(partner) = self
                .agents
                .spawn(prow, pcol, &mut self.rng, &mut bufs.alive_mask)
            else {
                break;
            };
            self.tiles.set_pid(prow, pcol, partner);
            for g in 0..genes {
                bufs.dnas[partner * genes + g] = bufs.dnas[first * genes + g];
            }
            self.agents.agent_mut(partner).role = self.rng.gen_range(0..self.cfg.n_roles);
            self.kinship
                .record_birth(partner, &bufs.alive_mask, &bufs.dnas, &mut bufs.kinship);
        }
    }

    fn random_free_cell(&mut self) -> Option<(u16, u16)> {
        for _ in 0..1024 {
            let row = self.rng.gen_range(0..self.tiles.height());
            let col = self.rng.gen_range(0..self.tiles.width());
            if !self.tiles.is_blocked(row, col) {
                return Some((row, col));
            }
        }
        None
    }

    fn adjacent_free_cell(&self, row: u16, col: u16) -> Option<(u16, u16)> {
        MOORE_OFFSETS.iter().find_map(|&(dr, dc)| {
            let nr = self.tiles.wrap_row(i32::from(row) + dr);
            let nc = self.tiles.wrap_col(i32::from(col) + dc);
            (!self.tiles.is_blocked(nr, nc)).then_some((nr, nc))
        })
    }

    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.cfg
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn episode_budget(&self) -> u64 {
        self.episode_budget
    }

    #[must_use]
    pub fn episodes_completed(&self) -> u64 {
        self.episodes_completed
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents.alive_count()
    }

    #[must_use]
    pub fn agents(&self) -> &AgentTable {
        &self.agents
    }

    #[must_use]
    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EnvConfig {
        EnvConfig {
            width: 12,
            height: 12,
            max_agents: 16,
            n_genes: 2,
            n_alleles: 3,
            min_ep_length: 20,
            max_ep_length: 30,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_reset_seeds_breeding_pairs() {
        let cfg = small_config();
        let mut bufs = SharedBuffers::new(&cfg);
        let mut engine = Engine::new(cfg.clone()).unwrap();
        engine.reset(&mut bufs).unwrap();

        assert_eq!(engine.alive_count(), 2 * INITIAL_PAIRS);
        // pair DNA is identical
        let genes = cfg.n_genes;
        for pair in 0..INITIAL_PAIRS {
            let a = 2 * pair;
            let b = 2 * pair + 1;
            assert_eq!(
                bufs.dnas[a * genes..(a + 1) * genes],
                bufs.dnas[b * genes..(b + 1) * genes]
            );
        }
        // episode budget drawn within bounds
        assert!((20..30).contains(&engine.episode_budget()));
    }

    #[test]
    fn test_step_keeps_invariants() {
        let cfg = small_config();
        let mut bufs = SharedBuffers::new(&cfg);
        let mut engine = Engine::new(cfg.clone()).unwrap();
        engine.reset(&mut bufs).unwrap();

        for code in [4, 0, 1, 5, 9, 10, 2, 6] {
            bufs.actions.fill(code);
            engine.step(&mut bufs).unwrap();
            for &pid in engine.agents().alive_pids() {
                let a = engine.agents().agent(pid);
                assert!(a.satiation > 0);
                assert!(a.hp > 0 && a.hp <= a.hp_max);
                assert!(a.row < cfg.height && a.col < cfg.width);
                assert_eq!(engine.tiles().pid_at(a.row, a.col), Some(pid));
            }
            let mask_alive = bufs.alive_mask.iter().filter(|&&m| m == 1).count();
            assert_eq!(mask_alive, engine.alive_count());
            assert_eq!(engine.agents().alive_pids().len(), engine.alive_count());
        }
    }

    #[test]
    fn test_kinship_stays_symmetric() {
        let cfg = small_config();
        let n = cfg.max_agents;
        let mut bufs = SharedBuffers::new(&cfg);
        let mut engine = Engine::new(cfg).unwrap();
        engine.reset(&mut bufs).unwrap();
        // forage to adulthood, then everyone tries to reproduce
        for _ in 0..12 {
            bufs.actions.fill(5);
            engine.step(&mut bufs).unwrap();
        }
        for _ in 0..6 {
            bufs.actions.fill(10);
            engine.step(&mut bufs).unwrap();
        }
        assert!(engine.alive_count() > 8, "expected births to occur");
        for i in 0..n {
            assert_eq!(bufs.kinship[i * n + i], 2);
            for j in 0..n {
                assert_eq!(bufs.kinship[i * n + j], bufs.kinship[j * n + i]);
            }
        }
    }

    #[test]
    fn test_pure_movement_conserves_food() {
        let cfg = small_config();
        let mut bufs = SharedBuffers::new(&cfg);
        let mut engine = Engine::new(cfg.clone()).unwrap();
        engine.reset(&mut bufs).unwrap();

        let total_food = |engine: &Engine| -> u64 {
            let carried: u64 = engine
                .agents()
                .alive_pids()
                .iter()
                .map(|&p| u64::from(engine.agents().agent(p).food_carried))
                .sum();
            let mut stored = 0u64;
            for row in 0..cfg.height {
                for col in 0..cfg.width {
                    stored += u64::from(engine.tiles().tile(row, col).stored_food);
                }
            }
            carried + stored
        };

        let before = total_food(&engine);
        bufs.actions.fill(0); // MoveUp only
        engine.step(&mut bufs).unwrap();
        // fresh spawns carry nothing and no one picked anything up
        assert_eq!(total_food(&engine), before);
    }

    #[test]
    fn test_missing_map_fails_init() {
        let cfg = EnvConfig {
            map_name: Some("is_soil_12_12_missing.bin".into()),
            ..small_config()
        };
        assert!(Engine::new(cfg).is_err());
    }

    #[test]
    fn test_invalid_config_fails_init() {
        let cfg = EnvConfig {
            max_agents: 0,
            ..small_config()
        };
        assert!(Engine::new(cfg).is_err());
    }
}
