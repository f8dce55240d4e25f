use crate::bitset::Pid;
use kinterra_data::EpisodeStats;

/// Running counters accumulated over one episode and folded into an
/// [`EpisodeStats`] record when it ends.
///
/// Population aggregates (`max_pop`, `min_pop`, `avg_population`) only
/// sample the window before the minimum episode length, so episodes of
/// different drawn budgets stay comparable. `min_pop` starts from the
/// seeded population, not zero.
#[derive(Debug, Clone, Default)]
pub struct EpisodeCounters {
    pub births: u64,
    pub starvations: u64,
    pub murders: u64,
    pub stone_mined: u64,
    pub walls_built: u64,
    pub walls_destroyed: u64,
    pub food_stored: u64,
    pub food_eaten: u64,
    pub max_pop: usize,
    pub min_pop: usize,
    pub total_reward: f64,
    death_age_sum: u64,
    deaths: u64,
    pop_sum: u64,
    pop_samples: u64,
}

impl EpisodeCounters {
    #[must_use]
    pub fn begin(initial_population: usize) -> Self {
        Self {
            max_pop: initial_population,
            min_pop: initial_population,
            ..Default::default()
        }
    }

    pub fn sample_population(&mut self, alive: usize) {
        self.max_pop = self.max_pop.max(alive);
        self.min_pop = self.min_pop.min(alive);
        self.pop_sum += alive as u64;
        self.pop_samples += 1;
    }

    pub fn record_death(&mut self, age: u32, starved: bool) {
        if starved {
            self.starvations += 1;
        }
        self.death_age_sum += u64::from(age);
        self.deaths += 1;
    }

    #[must_use]
    pub fn finalize(&self, episode_length: u64, n: u64, genetic_diversity: f64) -> EpisodeStats {
        EpisodeStats {
            births: self.births,
            starvations: self.starvations,
            murders: self.murders,
            stone_mined: self.stone_mined,
            walls_built: self.walls_built,
            walls_destroyed: self.walls_destroyed,
            food_stored: self.food_stored,
            food_eaten: self.food_eaten,
            max_pop: self.max_pop,
            min_pop: self.min_pop,
            avg_population: if self.pop_samples > 0 {
                self.pop_sum as f64 / self.pop_samples as f64
            } else {
                0.0
            },
            total_reward: self.total_reward,
            episode_length,
            life_expectancy: if self.deaths > 0 {
                self.death_age_sum as f64 / self.deaths as f64
            } else {
                0.0
            },
            genetic_diversity,
            n,
        }
    }
}

/// Summed Shannon entropy of the allele distribution per gene, in bits,
/// over the alive population.
#[must_use]
pub fn genetic_diversity(alive: &[Pid], dnas: &[u8], n_genes: usize, n_alleles: usize) -> f64 {
    if alive.is_empty() || n_genes == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    let mut counts = vec![0u32; n_alleles];
    for g in 0..n_genes {
        counts.fill(0);
        for &pid in alive {
            let allele = dnas[pid * n_genes + g] as usize;
            if allele < n_alleles {
                counts[allele] += 1;
            }
        }
        let total = alive.len() as f64;
        for &count in &counts {
            if count > 0 {
                let p = f64::from(count) / total;
                entropy -= p * p.log2();
            }
        }
    }
    entropy
}
