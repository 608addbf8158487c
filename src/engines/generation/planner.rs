use crate::config::RunConfig;
use crate::types::{
    round_to, AlphaSlot, DataSlot, ExecutionSlot, PortfolioSlot, RiskSlot, Route, Slots,
    StrategyGenome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::collections::BTreeMap;

const REBALANCE_CHOICES: [u32; 3] = [5, 10, 20];

/// Builds the generation-0 population.
///
/// A single generator, seeded from the run seed, is shared by every genome in
/// the population, so the parameter values of genome `i` depend on all genomes
/// drawn before it.
pub struct PopulationPlanner {
    rng: StdRng,
}

impl PopulationPlanner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.evolution.seed)
    }

    pub fn build_initial_population(mut self, config: &RunConfig) -> Vec<StrategyGenome> {
        (0..config.evolution.population_size)
            .map(|i| {
                let route = Route::ALL[i % Route::ALL.len()];
                let mut metadata = BTreeMap::new();
                metadata.insert(
                    "hypothesis".to_string(),
                    json!(format!("{} driven sector rotation", route)),
                );
                StrategyGenome {
                    id: StrategyGenome::fresh_id(0),
                    generation: 0,
                    parent_ids: Vec::new(),
                    route,
                    slots: self.random_slots(route),
                    metadata,
                }
            })
            .collect()
    }

    fn random_slots(&mut self, route: Route) -> Slots {
        let rng = &mut self.rng;
        let alpha_slot = AlphaSlot {
            route,
            momentum_w: round_to(rng.gen_range(0.1..0.8), 3),
            value_w: round_to(rng.gen_range(0.0..0.6), 3),
            volatility_w: round_to(rng.gen_range(-0.7..-0.1), 3),
            flow_w: round_to(rng.gen_range(0.0..0.4), 3),
        };
        let portfolio_slot = PortfolioSlot {
            max_weight: round_to(rng.gen_range(0.25..0.5), 3),
        };
        let risk_slot = RiskSlot {
            stop_loss: round_to(rng.gen_range(0.04..0.12), 3),
            de_risk: round_to(rng.gen_range(0.2..0.7), 3),
        };
        let execution_slot = ExecutionSlot {
            rebalance_days: REBALANCE_CHOICES[rng.gen_range(0..REBALANCE_CHOICES.len())],
            cost_bps: round_to(rng.gen_range(2.0..10.0), 2),
        };

        Slots {
            data_slot: DataSlot::default(),
            alpha_slot,
            portfolio_slot,
            risk_slot,
            execution_slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn config(population_size: usize) -> RunConfig {
        let mut config = RunConfig::new("planner");
        config.evolution.population_size = population_size;
        config
    }

    #[test]
    fn builds_exactly_population_size() {
        for size in [1, 4, 13] {
            let cfg = config(size);
            assert_eq!(PopulationPlanner::from_config(&cfg).build_initial_population(&cfg).len(), size);
        }
    }

    #[test]
    fn routes_rotate_round_robin() {
        let cfg = config(6);
        let population = PopulationPlanner::from_config(&cfg).build_initial_population(&cfg);
        let routes: Vec<Route> = population.iter().map(|g| g.route).collect();
        assert_eq!(
            routes,
            vec![Route::Macro, Route::Fundamental, Route::Quant, Route::Event, Route::Macro, Route::Fundamental]
        );
        assert!(population.iter().all(|g| g.slots.alpha_slot.route == g.route));
    }

    #[test]
    fn slot_values_stay_in_their_ranges() {
        let cfg = config(64);
        for genome in PopulationPlanner::from_config(&cfg).build_initial_population(&cfg) {
            let s = &genome.slots;
            assert!((0.1..=0.8).contains(&s.alpha_slot.momentum_w));
            assert!((0.0..=0.6).contains(&s.alpha_slot.value_w));
            assert!((-0.7..=-0.1).contains(&s.alpha_slot.volatility_w));
            assert!((0.0..=0.4).contains(&s.alpha_slot.flow_w));
            assert!((0.25..=0.5).contains(&s.portfolio_slot.max_weight));
            assert!((0.04..=0.12).contains(&s.risk_slot.stop_loss));
            assert!((0.2..=0.7).contains(&s.risk_slot.de_risk));
            assert!(REBALANCE_CHOICES.contains(&s.execution_slot.rebalance_days));
            assert!((2.0..=10.0).contains(&s.execution_slot.cost_bps));
            assert_eq!(genome.generation, 0);
            assert!(genome.parent_ids.is_empty());
        }
    }

    #[test]
    fn same_seed_same_parameters_but_fresh_ids() {
        let cfg = config(8);
        let a = PopulationPlanner::from_config(&cfg).build_initial_population(&cfg);
        let b = PopulationPlanner::from_config(&cfg).build_initial_population(&cfg);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.slots, y.slots);
            assert_eq!(x.route, y.route);
        }
        let ids: HashSet<&str> = a.iter().chain(&b).map(|g| g.id.as_str()).collect();
        assert_eq!(ids.len(), 16);
        assert!(a.iter().all(|g| g.id.starts_with("g0-") && g.id.len() == 11));
    }
}
