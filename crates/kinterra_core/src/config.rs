//! Configuration management for environment parameters.
//!
//! Strongly-typed options matching the host-facing init contract. Everything
//! that is legal to vary between runs lives here; world rules that define
//! the game itself are compile-time constants in [`crate::constants`].
//!
//! ## Example `config.toml`
//!
//! ```toml
//! width = 40
//! height = 40
//! max_agents = 64
//! n_genes = 3
//! n_alleles = 4
//! seed = 42
//! reward_growth_rate = true
//! ```

use crate::constants::VISION_RADIUS;
use serde::{Deserialize, Serialize};

/// Maximum gene count honoured by downstream tooling.
pub const MAX_GENES: usize = 3;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EnvConfig {
    pub width: u16,
    pub height: u16,
    pub max_agents: usize,
    pub n_genes: usize,
    pub n_alleles: u8,
    pub n_roles: u8,
    pub min_ep_length: u64,
    pub max_ep_length: u64,
    pub extinction_reward: f32,
    /// `false` selects the delta-family-size kernel, `true` the log-growth
    /// kernel with the extinction term.
    pub reward_growth_rate: bool,
    /// Soil bitmap file; `None` plays on an all-soil map.
    pub map_name: Option<String>,
    /// RNG seed for the single engine stream; `None` behaves as 0.
    pub seed: Option<u64>,
    /// Directory for the per-episode JSONL log; `None` disables it.
    pub log_dir: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            max_agents: 64,
            n_genes: 3,
            n_alleles: 4,
            n_roles: 3,
            min_ep_length: 500,
            max_ep_length: 1000,
            extinction_reward: -1.0,
            reward_growth_rate: false,
            map_name: None,
            seed: None,
            log_dir: None,
        }
    }
}

impl EnvConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` describing the
    /// first violation. Called once at engine init; failures are fatal.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.width >= 1, "Grid width must be positive");
        anyhow::ensure!(self.height >= 1, "Grid height must be positive");
        anyhow::ensure!(self.max_agents >= 1, "Agent capacity must be positive");
        anyhow::ensure!(
            self.n_genes <= MAX_GENES,
            "Gene count too large (max {})",
            MAX_GENES
        );
        anyhow::ensure!(self.n_alleles >= 1, "Allele count must be positive");
        anyhow::ensure!(self.n_roles >= 1, "Role count must be positive");
        anyhow::ensure!(
            self.min_ep_length >= 1,
            "Minimum episode length must be positive"
        );
        anyhow::ensure!(
            self.max_ep_length > self.min_ep_length,
            "Maximum episode length must exceed the minimum"
        );
        anyhow::ensure!(
            self.extinction_reward < 0.0,
            "Extinction reward must be negative"
        );
        Ok(())
    }

    /// Loads and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Bytes of one agent's observation vector: the vision field, the self
    /// block, and the world summary.
    #[must_use]
    pub fn obs_size(&self) -> usize {
        let side = 2 * VISION_RADIUS + 1;
        side * side * (11 + self.n_genes) + 6 + self.n_genes + 5
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self).as_bytes());
        hex::encode(hasher.finalize())
    }
}
