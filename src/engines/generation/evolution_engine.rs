use crate::config::RunConfig;
use crate::data::DataBundle;
use crate::engines::evaluation::Backtester;
use crate::engines::generation::{
    memory_store::MemoryStore,
    operators::evolve_population,
    planner::PopulationPlanner,
    progress::ProgressCallback,
    report::RunReport,
};
use crate::engines::metrics::MetricsEngine;
use crate::engines::validation::RiskGate;
use crate::error::Result;
use crate::types::{EvalReport, EvolutionResult, StrategyGenome};
use chrono::Utc;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

const META_RULE: &str = "prefer lower turnover under weak DSR";
const META_RULE_SUPPORT: f64 = 0.67;

/// Orchestrates a complete run: data, initial population, generations, memory and report.
pub struct EvolutionEngine {
    config: RunConfig,
    backtester: Backtester,
    metrics: MetricsEngine,
    risk_gate: RiskGate,
}

impl EvolutionEngine {
    /// Validates `config` up front so a bad configuration fails before any simulation.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backtester: Backtester::from_config(&config),
            metrics: MetricsEngine::new(),
            risk_gate: RiskGate::new(&config.risk),
            config,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Backtest, evaluate and risk-gate a single genome.
    pub fn evaluate(&self, genome: &StrategyGenome, data: &DataBundle) -> Result<EvalReport> {
        let backtest = self.backtester.run(genome, data)?;
        let report = self.metrics.evaluate(&genome.id, &backtest);
        Ok(self.risk_gate.scan(genome, &report))
    }

    /// Run the evolution process.
    ///
    /// Every call starts from the seed again, so repeated runs with the same
    /// configuration produce the same numbers.
    pub fn run<C: ProgressCallback>(&self, mut callback: C) -> Result<EvolutionResult> {
        let evolution = &self.config.evolution;
        info!(
            "Starting run '{}': {} genomes x {} generations over {} markets",
            self.config.run_id,
            evolution.population_size,
            evolution.generations,
            self.config.data.markets.len()
        );

        let data = DataBundle::from_config(&self.config);
        let mut population = PopulationPlanner::from_config(&self.config).build_initial_population(&self.config);
        let memory = MemoryStore::open(self.config.memory_dir())?;
        let mut rng = StdRng::seed_from_u64(evolution.seed);

        let mut all_reports: Vec<EvalReport> =
            Vec::with_capacity(evolution.population_size * evolution.generations);

        for generation in 0..evolution.generations {
            callback.on_generation_start(generation, population.len());

            let total = population.len();
            let mut ranked = Vec::with_capacity(total);
            for (i, genome) in population.into_iter().enumerate() {
                let report = self.evaluate(&genome, &data)?;
                debug!(
                    "[{}] fitness {:.4} tags {:?} passed {}",
                    genome.id, report.metrics.fitness, report.diagnosis_tags, report.passed_risk_gate
                );

                if report.passed_risk_gate {
                    memory.record_success(&genome, &report)?;
                } else {
                    memory.record_failure(&genome, &report)?;
                }
                all_reports.push(report.clone());
                ranked.push((genome, report));
                callback.on_strategy_evaluated(i + 1, total);
            }

            ranked.sort_by(|a, b| {
                b.1.metrics
                    .fitness
                    .partial_cmp(&a.1.metrics.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let best_fitness = ranked.first().map(|(_, r)| r.metrics.fitness).unwrap_or(0.0);
            let passed = ranked.iter().filter(|(_, r)| r.passed_risk_gate).count();
            callback.on_generation_complete(generation, best_fitness, passed);

            if generation + 1 == evolution.generations {
                break;
            }

            population = evolve_population(&ranked, evolution, &mut rng);
            callback.on_population_evolved(generation, &population);
        }

        let mut final_ranked = all_reports;
        final_ranked.sort_by(|a, b| {
            b.metrics
                .fitness
                .partial_cmp(&a.metrics.fitness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top_candidates: Vec<EvalReport> = final_ranked
            .iter()
            .filter(|r| r.passed_risk_gate)
            .take(evolution.top_k)
            .cloned()
            .collect();

        if top_candidates.is_empty() {
            warn!("No genome passed the risk gate in run '{}'", self.config.run_id);
        } else {
            memory.record_meta_rule(META_RULE, META_RULE_SUPPORT)?;
        }

        let timestamp = Utc::now();
        let report = RunReport {
            generated_at: timestamp,
            top_k: evolution.top_k,
            reports: final_ranked,
        };
        let report_path = report.write(&self.config.run_dir())?;
        info!(
            "Run '{}' finished: {} reports, {} top candidates, report at {}",
            self.config.run_id,
            report.reports.len(),
            top_candidates.len(),
            report_path.display()
        );

        Ok(EvolutionResult {
            config: self.config.clone(),
            timestamp,
            top_candidates,
            reports: report.reports,
            memory_updates: memory.summarize_counts()?,
        })
    }
}
