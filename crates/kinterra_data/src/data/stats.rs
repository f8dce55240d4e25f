use serde::{Deserialize, Serialize};

/// Aggregates emitted once per finished episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
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
    pub avg_population: f64,
    pub total_reward: f64,
    pub episode_length: u64,
    pub life_expectancy: f64,
    pub genetic_diversity: f64,
    pub n: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_json_round_trip() {
        let stats = EpisodeStats {
            births: 7,
            episode_length: 500,
            avg_population: 9.25,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: EpisodeStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
