use crate::bitset::Pid;
use crate::config::EnvConfig;

/// The host-owned buffer block shared with external policies.
///
/// The host allocates these once per environment and the engine borrows
/// them for the duration of each `reset`/`step` call, mutating in place and
/// never freeing. Shapes are fixed by the config; a mismatch is a fatal
/// init-time error, checked on every reset.
#[derive(Debug, Clone)]
pub struct SharedBuffers {
    /// `max_agents * obs_size` observation bytes, agent-major.
    pub observations: Vec<u8>,
    /// One action code per slot, written by the policy before `step`.
    pub actions: Vec<i32>,
    pub rewards: Vec<f32>,
    pub terminals: Vec<u8>,
    pub truncations: Vec<u8>,
    pub alive_mask: Vec<u8>,
    /// Symmetric `max_agents * max_agents` kinship matrix, row-major.
    pub kinship: Vec<u8>,
    /// `max_agents * n_genes` allele bytes; persists across deaths.
    pub dnas: Vec<u8>,
}

impl SharedBuffers {
    #[must_use]
    pub fn new(config: &EnvConfig) -> Self {
        let n = config.max_agents;
        Self {
            observations: vec![0; n * config.obs_size()],
            actions: vec![0; n],
            rewards: vec![0.0; n],
            terminals: vec![0; n],
            truncations: vec![0; n],
            alive_mask: vec![0; n],
            kinship: vec![0; n * n],
            dnas: vec![0; n * config.n_genes],
        }
    }

    pub fn validate(&self, config: &EnvConfig) -> anyhow::Result<()> {
        let n = config.max_agents;
        anyhow::ensure!(
            self.observations.len() == n * config.obs_size(),
            "Observation buffer holds {} bytes, expected {}",
            self.observations.len(),
            n * config.obs_size()
        );
        anyhow::ensure!(self.actions.len() == n, "Action buffer shape mismatch");
        anyhow::ensure!(self.rewards.len() == n, "Reward buffer shape mismatch");
        anyhow::ensure!(self.terminals.len() == n, "Terminal buffer shape mismatch");
        anyhow::ensure!(
            self.truncations.len() == n,
            "Truncation buffer shape mismatch"
        );
        anyhow::ensure!(
            self.alive_mask.len() == n,
            "Alive-mask buffer shape mismatch"
        );
        anyhow::ensure!(
            self.kinship.len() == n * n,
            "Kinship matrix shape mismatch"
        );
        anyhow::ensure!(
            self.dnas.len() == n * config.n_genes,
            "DNA buffer shape mismatch"
        );
        Ok(())
    }

    #[must_use]
    pub fn dna(&self, pid: Pid, n_genes: usize) -> &[u8] {
        &self.dnas[pid * n_genes..(pid + 1) * n_genes]
    }

    #[must_use]
    pub fn observation(&self, pid: Pid, obs_size: usize) -> &[u8] {
        &self.observations[pid * obs_size..(pid + 1) * obs_size]
    }
}
