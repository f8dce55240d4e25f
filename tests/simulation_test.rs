//! End-to-end scenarios exercised at component level, where initial
//! conditions can be pinned exactly.

use kinterra_core::agents::AgentTable;
use kinterra_core::bitset::Pid;
use kinterra_core::calendar::Calendar;
use kinterra_core::config::EnvConfig;
use kinterra_core::constants::{MAX_SATIATION, REPRODUCTION_AGE, WALL_HP_MAX};
use kinterra_core::kinship::KinshipEngine;
use kinterra_core::shared::SharedBuffers;
use kinterra_core::soil::SoilMap;
use kinterra_core::systems::action::ActionResolver;
use kinterra_core::systems::reward::{compute_rewards, death_sweep};
use kinterra_core::systems::stats::EpisodeCounters;
use kinterra_core::tiles::TileGrid;
use kinterra_lib::{Direction, Engine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct World {
    cfg: EnvConfig,
    calendar: Calendar,
    tiles: TileGrid,
    agents: AgentTable,
    kinship: KinshipEngine,
    counters: EpisodeCounters,
    rng: ChaCha8Rng,
    bufs: SharedBuffers,
    dead: Vec<Pid>,
}

impl World {
    fn new(cfg: EnvConfig) -> Self {
        let mut bufs = SharedBuffers::new(&cfg);
        let mut kinship = KinshipEngine::new(cfg.max_agents, cfg.n_genes);
        kinship.reset(&mut bufs.kinship);
        Self {
            tiles: TileGrid::new(SoilMap::all_soil(cfg.width, cfg.height)),
            agents: AgentTable::new(cfg.max_agents),
            kinship,
            counters: EpisodeCounters::begin(0),
            rng: ChaCha8Rng::seed_from_u64(11),
            calendar: Calendar {
                day: 0,
                is_winter: false,
            },
            bufs,
            cfg,
            dead: Vec::new(),
        }
    }

    fn spawn_at(&mut self, row: u16, col: u16, dna: &[u8]) -> Pid {
        let pid = self
            .agents
            .spawn(row, col, &mut self.rng, &mut self.bufs.alive_mask)
            .unwrap();
        self.tiles.set_pid(row, col, pid);
        let genes = self.cfg.n_genes;
        self.bufs.dnas[pid * genes..(pid + 1) * genes].copy_from_slice(dna);
        self.kinship.record_birth(
            pid,
            &self.bufs.alive_mask,
            &self.bufs.dnas,
            &mut self.bufs.kinship,
        );
        self.agents.refresh_alive_list();
        pid
    }

    /// One action pass over the current alive list, without the sweep.
    fn act(&mut self) {
        let order = self.agents.alive_pids().to_vec();
        let mut resolver = ActionResolver {
            cfg: &self.cfg,
            calendar: &self.calendar,
            tiles: &mut self.tiles,
            agents: &mut self.agents,
            kinship: &mut self.kinship,
            counters: &mut self.counters,
            rng: &mut self.rng,
        };
        resolver.run(&order, &mut self.bufs);
        self.agents.refresh_alive_list();
    }

    fn sweep_and_reward(&mut self) {
        self.bufs.terminals.fill(0);
        death_sweep(
            &mut self.agents,
            &mut self.tiles,
            &mut self.counters,
            &mut self.bufs,
            &mut self.dead,
        );
        self.agents.refresh_alive_list();
        compute_rewards(
            &mut self.kinship,
            &self.agents,
            &self.dead,
            &self.cfg,
            &mut self.counters,
            &mut self.bufs,
        );
    }
}

fn forager_config() -> EnvConfig {
    EnvConfig {
        width: 8,
        height: 8,
        max_agents: 4,
        n_genes: 1,
        n_alleles: 2,
        ..Default::default()
    }
}

// Scenario: lone forager on soil. The crop timer accrues while pickups
// yield nothing, and the day-70 harvest delivers the full 150 units, which
// the next tick's auto-eat then drains against accumulated hunger.
#[test]
fn test_lone_forager_harvests_full_growth() {
    let mut world = World::new(forager_config());
    let pid = world.spawn_at(0, 0, &[0]);
    world.bufs.actions[pid] = 4; // Noop while the crop grows

    for day in 1..=69 {
        world.calendar.day = day;
        world.act();
    }
    assert_eq!(world.agents.agent(pid).food_carried, 0);
    assert_eq!(world.tiles.tile(0, 0).last_harvest, 0);

    world.calendar.day = 70;
    world.bufs.actions[pid] = 5; // Pickup
    world.act();
    assert_eq!(world.agents.agent(pid).food_carried, 150);
    assert_eq!(world.tiles.tile(0, 0).last_harvest, 70);

    // satiation drained 5 per tick over 70 ticks with nothing to eat
    assert_eq!(world.agents.agent(pid).satiation, MAX_SATIATION - 350);

    // the following tick the whole harvest is auto-eaten against the debt
    world.calendar.day = 71;
    world.act();
    assert_eq!(world.agents.agent(pid).food_carried, 0);
    assert_eq!(world.counters.food_eaten, 150);
}

// Scenario: starvation. One tick of metabolism pushes satiation to -4 and
// the sweep recycles the slot.
#[test]
fn test_starvation_terminates_agent() {
    let mut world = World::new(forager_config());
    let pid = world.spawn_at(3, 3, &[0]);
    world.agents.agent_mut(pid).satiation = 1;
    world.bufs.actions[pid] = 4;

    world.act();
    assert_eq!(world.agents.agent(pid).satiation, -4);
    world.sweep_and_reward();

    assert_eq!(world.bufs.terminals[pid], 1);
    assert_eq!(world.agents.alive_count(), 0);
    assert_eq!(world.bufs.alive_mask[pid], 0);
    assert_eq!(world.tiles.pid_at(3, 3), None);
}

// Scenario: reproduction between two willing adults.
#[test]
fn test_adjacent_adults_reproduce() {
    let mut world = World::new(forager_config());
    let a = world.spawn_at(4, 4, &[0]);
    let b = world.spawn_at(4, 5, &[1]);
    for pid in [a, b] {
        world.agents.agent_mut(pid).age = REPRODUCTION_AGE;
        world.agents.agent_mut(pid).satiation = 80;
        world.bufs.actions[pid] = 10; // Reproduce
    }

    world.act();

    assert_eq!(world.agents.alive_count(), 3);
    let child = world
        .agents
        .alive_pids()
        .iter()
        .copied()
        .find(|&p| p != a && p != b)
        .unwrap();
    // both parents paid half their satiation bar (a also aged first)
    assert_eq!(world.agents.agent(a).satiation, 80 - 5 - 50);
    // b was processed after a in list order and paid its own metabolism too
    assert_eq!(world.agents.agent(b).satiation, 80 - 5 - 50);
    // the child's single gene came from one of the parents
    let allele = world.bufs.dnas[child];
    assert!(allele == 0 || allele == 1);
    let c = world.agents.agent(child);
    assert_eq!(world.tiles.pid_at(c.row, c.col), Some(child));
    assert_eq!(world.counters.births, 1);
}

// Scenario: wall blocks movement until attacked down, then growth restarts.
#[test]
fn test_wall_blocks_until_destroyed() {
    let mut world = World::new(forager_config());
    world.calendar.day = 25;
    let pid = world.spawn_at(2, 2, &[0]);
    world.agents.agent_mut(pid).dir = Direction::Right;
    world.agents.agent_mut(pid).satiation = 1000;
    assert!(world.tiles.place_wall(2, 3));

    world.bufs.actions[pid] = 1; // MoveRight
    world.act();
    let a = *world.agents.agent(pid);
    assert_eq!((a.row, a.col), (2, 2));
    assert_eq!(a.dir, Direction::Right);

    world.bufs.actions[pid] = 9; // Attack
    for hit in 1..=WALL_HP_MAX {
        world.act();
        assert_eq!(world.tiles.tile(2, 3).wall_hp, WALL_HP_MAX - hit);
    }
    assert_eq!(world.counters.walls_destroyed, 1);
    // summer on soil: the crop timer restarted the moment the wall fell
    assert_eq!(world.tiles.tile(2, 3).last_harvest, 25);
    assert!(!world.tiles.is_blocked(2, 3));
}

// Scenario: delta rewards after an unrelated agent dies. The kin pair's
// families never contained the stranger, so its death pays them nothing.
#[test]
fn test_kinship_delta_reward_after_stranger_dies() {
    let mut world = World::new(forager_config());
    let kin_a = world.spawn_at(0, 0, &[0]);
    let kin_b = world.spawn_at(0, 2, &[0]);
    let stranger = world.spawn_at(5, 5, &[1]);
    world.bufs.actions.fill(4);

    // settle the post-birth baseline
    world.sweep_and_reward();
    assert_eq!(world.kinship.family_size(kin_a), 2);
    assert_eq!(world.kinship.family_size(kin_b), 2);
    assert_eq!(world.kinship.family_size(stranger), 1);

    world.agents.agent_mut(stranger).satiation = 1;
    world.act();
    world.sweep_and_reward();

    assert_eq!(world.bufs.terminals[stranger], 1);
    assert_eq!(world.bufs.rewards[kin_a], 0.0);
    assert_eq!(world.bufs.rewards[kin_b], 0.0);
    // the stranger's family collapsed from 1 to 0
    assert_eq!(world.bufs.rewards[stranger], -1.0);
}

// Scenario: the drawn episode budget truncates and rolls the episode over.
#[test]
fn test_episode_budget_truncates_and_resets() {
    let cfg = EnvConfig {
        width: 16,
        height: 16,
        max_agents: 16,
        min_ep_length: 5,
        max_ep_length: 6,
        seed: Some(3),
        ..Default::default()
    };
    let mut bufs = SharedBuffers::new(&cfg);
    let mut engine = Engine::new(cfg).unwrap();
    engine.reset(&mut bufs).unwrap();
    assert_eq!(engine.episode_budget(), 5);

    for call in 1..=24u64 {
        bufs.actions.fill(4);
        engine.step(&mut bufs).unwrap();
        let expect_truncated = call % 6 == 5;
        assert_eq!(
            bufs.truncations.iter().all(|&t| t == 1),
            expect_truncated,
            "call {}",
            call
        );
        assert_eq!(engine.episodes_completed(), call / 6);
    }
}
