use super::traits::{invalid, ConfigSection};
use crate::error::EvoquantError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub top_k: usize,
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 12,
            generations: 4,
            mutation_rate: 0.4,
            crossover_rate: 0.4,
            top_k: 3,
            seed: 42,
        }
    }
}

impl EvolutionConfig {
    /// Number of genomes treated as elites when breeding the next generation.
    pub fn elite_count(&self) -> usize {
        self.top_k.max(2)
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvoquantError> {
        if self.population_size == 0 {
            return Err(invalid(Self::section_name(), "Population size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(invalid(
                Self::section_name(),
                "Mutation rate must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(invalid(
                Self::section_name(),
                "Crossover rate must be between 0 and 1",
            ));
        }
        if self.top_k == 0 {
            return Err(invalid(Self::section_name(), "top_k must be positive"));
        }
        Ok(())
    }
}
