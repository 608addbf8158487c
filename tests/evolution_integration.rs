use evoquant::config::{ConfigManager, RunConfig};
use evoquant::data::DataBundle;
use evoquant::engines::generation::{
    EvolutionEngine, MemoryStore, PopulationPlanner, ProgressCallback, RunReport, REPORT_FILE,
};
use evoquant::types::{EvalMetrics, RiskReason, StrategyGenome};
use std::collections::HashSet;
use std::path::Path;

/// Progress callback that keeps every bred population for inspection
#[derive(Default)]
struct RecordingCallback {
    generations_started: usize,
    evaluated: usize,
    best_per_generation: Vec<f64>,
    populations: Vec<Vec<StrategyGenome>>,
}

impl ProgressCallback for &mut RecordingCallback {
    fn on_generation_start(&mut self, _generation: usize, _population_size: usize) {
        self.generations_started += 1;
    }

    fn on_strategy_evaluated(&mut self, _strategy_num: usize, _total: usize) {
        self.evaluated += 1;
    }

    fn on_generation_complete(&mut self, _generation: usize, best_fitness: f64, _passed: usize) {
        self.best_per_generation.push(best_fitness);
    }

    fn on_population_evolved(&mut self, _generation: usize, next_population: &[StrategyGenome]) {
        self.populations.push(next_population.to_vec());
    }
}

fn scenario_config(output_dir: &Path) -> RunConfig {
    let mut config = RunConfig::new("pytest-run");
    config.output_dir = output_dir.to_path_buf();
    config.evolution.generations = 2;
    config.evolution.population_size = 8;
    config.evolution.top_k = 2;
    config.evolution.seed = 7;
    config
}

fn metrics_of(config: &RunConfig) -> Vec<EvalMetrics> {
    let engine = EvolutionEngine::new(config.clone()).unwrap();
    let mut callback = RecordingCallback::default();
    engine
        .run(&mut callback)
        .unwrap()
        .reports
        .iter()
        .map(|r| r.metrics)
        .collect()
}

/// Evaluates `population` and returns the genome with the highest fitness (first on ties).
fn best_of(engine: &EvolutionEngine, population: &[StrategyGenome], data: &DataBundle) -> StrategyGenome {
    let mut best: Option<(f64, &StrategyGenome)> = None;
    for genome in population {
        let fitness = engine.evaluate(genome, data).unwrap().metrics.fitness;
        if best.map_or(true, |(f, _)| fitness > f) {
            best = Some((fitness, genome));
        }
    }
    best.unwrap().1.clone()
}

#[test]
fn test_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path());
    let engine = EvolutionEngine::new(config).unwrap();

    let mut callback = RecordingCallback::default();
    let result = engine.run(&mut callback).unwrap();

    assert_eq!(result.config.run_id, "pytest-run");
    assert_eq!(result.reports.len(), 16);
    assert!(result.top_candidates.len() <= 2);
    assert!(result.top_candidates.iter().all(|r| r.passed_risk_gate));
    assert_eq!(callback.generations_started, 2);
    assert_eq!(callback.evaluated, 16);

    let fitness: Vec<f64> = result.reports.iter().map(|r| r.metrics.fitness).collect();
    assert!(fitness.windows(2).all(|w| w[0] >= w[1]));

    let report_path = dir.path().join("pytest-run").join(REPORT_FILE);
    assert!(report_path.exists());
    let on_disk = RunReport::load(&report_path).unwrap();
    assert_eq!(on_disk.top_k, 2);
    assert_eq!(on_disk.reports.len(), 16);
    let disk_fitness: Vec<f64> = on_disk.reports.iter().map(|r| r.metrics.fitness).collect();
    assert!(disk_fitness.windows(2).all(|w| w[0] >= w[1]));
    let ids = |reports: &[evoquant::types::EvalReport]| {
        reports.iter().map(|r| r.strategy_id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&on_disk.reports), ids(&result.reports));
}

#[test]
fn test_strategy_ids_are_unique_within_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.evolution.generations = 4;
    let result = EvolutionEngine::new(config)
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();

    assert_eq!(result.reports.len(), 32);
    let ids: HashSet<&str> = result.reports.iter().map(|r| r.strategy_id.as_str()).collect();
    assert_eq!(ids.len(), result.reports.len());
}

#[test]
fn test_top_candidates_are_best_passing_reports() {
    let dir = tempfile::tempdir().unwrap();
    let result = EvolutionEngine::new(scenario_config(dir.path()))
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();

    let expected: Vec<_> = result
        .reports
        .iter()
        .filter(|r| r.passed_risk_gate)
        .take(2)
        .cloned()
        .collect();
    assert_eq!(result.top_candidates, expected);

    let expected_rules = usize::from(!expected.is_empty());
    assert_eq!(result.memory_updates.meta_rules, expected_rules);
}

#[test]
fn test_generation_zero_is_deterministic() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let config_a = scenario_config(dir_a.path());
    let config_b = scenario_config(dir_b.path());

    let engine = EvolutionEngine::new(config_a.clone()).unwrap();
    let data = DataBundle::from_config(&config_a);
    let first: Vec<EvalMetrics> = PopulationPlanner::from_config(&config_a)
        .build_initial_population(&config_a)
        .iter()
        .map(|g| engine.evaluate(g, &data).unwrap().metrics)
        .collect();
    let second: Vec<EvalMetrics> = PopulationPlanner::from_config(&config_b)
        .build_initial_population(&config_b)
        .iter()
        .map(|g| engine.evaluate(g, &DataBundle::from_config(&config_b)).unwrap().metrics)
        .collect();
    assert_eq!(first, second);

    // the whole run reproduces too, identity strings aside
    assert_eq!(metrics_of(&config_a), metrics_of(&config_b));
}

#[test]
fn test_population_size_preserved_and_best_survives() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    config.evolution.generations = 4;
    config.evolution.population_size = 10;
    config.evolution.top_k = 3;

    let engine = EvolutionEngine::new(config.clone()).unwrap();
    let mut callback = RecordingCallback::default();
    engine.run(&mut callback).unwrap();

    // one bred population per generation boundary
    assert_eq!(callback.populations.len(), 3);
    assert!(callback.populations.iter().all(|p| p.len() == 10));

    let data = DataBundle::from_config(&config);
    let mut current = PopulationPlanner::from_config(&config).build_initial_population(&config);
    for next in &callback.populations {
        let best = best_of(&engine, &current, &data);
        assert!(
            next.iter().any(|g| g.slots == best.slots),
            "best genome {} missing from next generation",
            best.id
        );
        current = next.clone();
    }
}

#[test]
fn test_memory_grows_by_population_times_generations() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path());
    let result = EvolutionEngine::new(config.clone())
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();

    let counts = result.memory_updates;
    assert_eq!(counts.alpha_zoo + counts.hall_of_shame, 8 * 2);
    let passed = result.reports.iter().filter(|r| r.passed_risk_gate).count();
    assert_eq!(counts.alpha_zoo, passed);

    // a second run against the same output location keeps appending
    let mut rerun = config.clone();
    rerun.run_id = "second".to_string();
    let second = EvolutionEngine::new(rerun)
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();
    let counts = second.memory_updates;
    assert_eq!(counts.alpha_zoo + counts.hall_of_shame, 2 * 8 * 2);

    let memory = MemoryStore::open(config.memory_dir()).unwrap();
    assert_eq!(memory.summarize_counts().unwrap(), counts);
}

#[test]
fn test_risk_gate_flags_every_breach() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = scenario_config(dir.path());
    // tight limits so that both outcomes show up
    config.risk.mdd_limit = 0.05;
    config.risk.turnover_limit = 1.0;
    let result = EvolutionEngine::new(config.clone())
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();

    for report in &result.reports {
        if report.metrics.mdd > config.risk.mdd_limit {
            assert!(!report.passed_risk_gate);
            assert!(report.has_reason(RiskReason::MddLimitExceeded));
        }
        if report.metrics.turnover > config.risk.turnover_limit {
            assert!(!report.passed_risk_gate);
            assert!(report.has_reason(RiskReason::TurnoverLimitExceeded));
        }
        assert_eq!(report.passed_risk_gate, report.risk_reasons.is_empty());
    }
}

#[test]
fn test_missing_market_data_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = scenario_config(dir.path());
    let engine = EvolutionEngine::new(config.clone()).unwrap();

    let mut partial = config.clone();
    partial.data.markets = vec!["cn_sector".to_string()];
    let data = DataBundle::from_config(&partial);
    let genome = &PopulationPlanner::from_config(&config).build_initial_population(&config)[0];
    assert!(engine.evaluate(genome, &data).is_err());
}

#[test]
fn test_run_from_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
run_id = "toml-run"
output_dir = "{}"

[data]
markets = ["cn_sector", "us_sector", "eu_sector"]
periods = 120

[evolution]
population_size = 6
generations = 3
top_k = 2
seed = 9
"#,
        dir.path().display()
    );
    let config = ConfigManager::with_env_prefix("EVOQUANT_IT_UNUSED")
        .load_from_str(&toml)
        .unwrap();
    let result = EvolutionEngine::new(config)
        .unwrap()
        .run(&mut RecordingCallback::default())
        .unwrap();

    assert_eq!(result.reports.len(), 18);
    assert!(dir.path().join("toml-run").join(REPORT_FILE).exists());
}
