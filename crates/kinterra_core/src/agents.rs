use crate::bitset::{Pid, PidBitset};
use crate::constants::MAX_SATIATION;
use kinterra_data::{Agent, Direction};
use rand::Rng;

/// Fixed-capacity agent table with free-list slot recycling.
///
/// Identifiers are indices, not identities: after a death sweep a future
/// spawn may hand the same pid back. Liveness is tracked three ways that
/// must stay in sync - the bitset, the host-visible alive mask, and the
/// cached ordered `alive_pids` list. The list is only rebuilt by
/// `refresh_alive_list`; any pass that iterates alive agents must refresh
/// after a batch of births or deaths.
#[derive(Debug, Clone)]
pub struct AgentTable {
    agents: Vec<Agent>,
    free: Vec<Pid>,
    alive: PidBitset,
    alive_pids: Vec<Pid>,
    next_pid: Pid,
    alive_count: usize,
}

impl AgentTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            agents: vec![Agent::default(); capacity],
            free: Vec::with_capacity(capacity),
            alive: PidBitset::new(capacity),
            alive_pids: Vec::with_capacity(capacity),
            next_pid: 0,
            alive_count: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    #[must_use]
    pub fn is_alive(&self, pid: Pid) -> bool {
        self.alive.contains(pid)
    }

    #[must_use]
    pub fn agent(&self, pid: Pid) -> &Agent {
        &self.agents[pid]
    }

    pub fn agent_mut(&mut self, pid: Pid) -> &mut Agent {
        &mut self.agents[pid]
    }

    /// Distinct mutable borrows of two slots, attacker-and-victim style.
    pub fn pair_mut(&mut self, a: Pid, b: Pid) -> (&mut Agent, &mut Agent) {
        assert_ne!(a, b);
        if a < b {
            let (lo, hi) = self.agents.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.agents.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    /// Allocates a slot at full capacity silently: `None`, nothing changes.
    ///
    /// The fresh record starts as a newborn - random facing, a single hit
    /// point, full satiation, empty hands. The caller is responsible for
    /// the `pid_at` index entry, the DNA bytes, and the role.
    pub fn spawn<R: Rng>(
        &mut self,
        row: u16,
        col: u16,
        rng: &mut R,
        alive_mask: &mut [u8],
    ) -> Option<Pid> {
        if self.alive_count == self.capacity() {
            return None;
        }
        let pid = self.free.pop().unwrap_or_else(|| {
            let pid = self.next_pid;
            self.next_pid += 1;
            pid
        });
        self.alive.add(pid);
        alive_mask[pid] = 1;
        self.alive_count += 1;
        self.agents[pid] = Agent {
            row,
            col,
            dir: Direction::from_index(rng.gen_range(0..4)),
            hp: 1,
            hp_max: 1,
            satiation: MAX_SATIATION,
            age: 0,
            food_carried: 0,
            stone_carried: 0,
            role: 0,
        };
        Some(pid)
    }

    /// Recycles a slot. The record, the kinship row and the `pid_at` entry
    /// are left for the caller; the reward engine still reads the record
    /// this tick.
    pub fn kill(&mut self, pid: Pid, alive_mask: &mut [u8]) {
        self.free.push(pid);
        self.alive.remove(pid);
        alive_mask[pid] = 0;
        self.alive_count -= 1;
    }

    /// Rebuilds the cached ordered alive list from the bitset.
    pub fn refresh_alive_list(&mut self) {
        self.alive.enumerate_into(&mut self.alive_pids);
    }

    #[must_use]
    pub fn alive_pids(&self) -> &[Pid] {
        &self.alive_pids
    }

    /// Fisher-Yates shuffle of the cached list, defining this tick's
    /// processing order.
    pub fn shuffle_alive<R: Rng>(&mut self, rng: &mut R) {
        use rand::seq::SliceRandom;
        self.alive_pids.shuffle(rng);
    }

    pub fn reset(&mut self) {
        self.agents.fill(Agent::default());
        self.free.clear();
        self.alive.clear();
        self.alive_pids.clear();
        self.next_pid = 0;
        self.alive_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_spawn_initialises_newborn() {
        let mut table = AgentTable::new(4);
        let mut mask = [0u8; 4];
        let pid = table.spawn(2, 3, &mut rng(), &mut mask).unwrap();
        let a = table.agent(pid);
        assert_eq!((a.row, a.col), (2, 3));
        assert_eq!((a.hp, a.hp_max), (1, 1));
        assert_eq!(a.satiation, MAX_SATIATION);
        assert_eq!(a.age, 0);
        assert_eq!(mask[pid], 1);
        assert_eq!(table.alive_count(), 1);
    }

    #[test]
    fn test_spawn_full_is_silent() {
        let mut table = AgentTable::new(2);
        let mut mask = [0u8; 2];
        let mut r = rng();
        assert!(table.spawn(0, 0, &mut r, &mut mask).is_some());
        assert!(table.spawn(0, 1, &mut r, &mut mask).is_some());
        assert!(table.spawn(0, 2, &mut r, &mut mask).is_none());
        assert_eq!(table.alive_count(), 2);
    }

    #[test]
    fn test_kill_recycles_slot() {
        let mut table = AgentTable::new(3);
        let mut mask = [0u8; 3];
        let mut r = rng();
        let a = table.spawn(0, 0, &mut r, &mut mask).unwrap();
        let b = table.spawn(0, 1, &mut r, &mut mask).unwrap();
        table.kill(a, &mut mask);
        assert_eq!(mask[a], 0);
        assert!(!table.is_alive(a));
        assert!(table.is_alive(b));
        // the freed slot is preferred over the high-water mark
        let c = table.spawn(1, 1, &mut r, &mut mask).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_alive_list_tracks_bitset() {
        let mut table = AgentTable::new(8);
        let mut mask = [0u8; 8];
        let mut r = rng();
        for col in 0..5 {
            table.spawn(0, col, &mut r, &mut mask);
        }
        table.kill(2, &mut mask);
        table.refresh_alive_list();
        assert_eq!(table.alive_pids(), &[0, 1, 3, 4]);
        assert_eq!(table.alive_pids().len(), table.alive_count());
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut table = AgentTable::new(16);
        let mut mask = [0u8; 16];
        let mut r = rng();
        for col in 0..16 {
            table.spawn(0, col, &mut r, &mut mask);
        }
        table.refresh_alive_list();
        table.shuffle_alive(&mut r);
        let mut sorted = table.alive_pids().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_pair_mut_borrows_both_orders() {
        let mut table = AgentTable::new(4);
        let mut mask = [0u8; 4];
        let mut r = rng();
        table.spawn(0, 0, &mut r, &mut mask);
        table.spawn(0, 1, &mut r, &mut mask);
        let (x, y) = table.pair_mut(1, 0);
        x.food_carried = 5;
        y.food_carried = 9;
        assert_eq!(table.agent(1).food_carried, 5);
        assert_eq!(table.agent(0).food_carried, 9);
    }
}
