use crate::types::StrategyGenome;
use log::{debug, info};

/// Hooks the evolution loop calls as it works through a run
pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population_size: usize);
    fn on_strategy_evaluated(&mut self, strategy_num: usize, total: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, passed: usize);

    /// Called with the population bred for `generation + 1`.
    fn on_population_evolved(&mut self, _generation: usize, _next_population: &[StrategyGenome]) {}
}

pub struct LogProgressCallback {
    total_generations: usize,
}

impl LogProgressCallback {
    pub fn new(total_generations: usize) -> Self {
        Self { total_generations }
    }
}

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population_size: usize) {
        info!(
            "Generation {}/{} starting with {} genomes",
            generation + 1,
            self.total_generations,
            population_size
        );
    }

    fn on_strategy_evaluated(&mut self, strategy_num: usize, total: usize) {
        if strategy_num % 10 == 0 || strategy_num == total {
            debug!("  Evaluated {}/{} strategies", strategy_num, total);
        }
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, passed: usize) {
        info!(
            "Generation {}/{} complete. Best fitness: {:.4}, passed risk gate: {}",
            generation + 1,
            self.total_generations,
            best_fitness,
            passed
        );
    }
}
