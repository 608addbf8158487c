use crate::config::EvolutionConfig;
use crate::types::{round_to, DiagnosisTag, EvalReport, Slots, StrategyGenome};
use rand::Rng;
use serde_json::json;

const MAX_REBALANCE_DAYS: u32 = 20;
const REBALANCE_STEP: u32 = 5;
const MIN_MAX_WEIGHT: f64 = 0.2;
const MAX_WEIGHT_STEP: f64 = 0.05;
const MIN_STOP_LOSS: f64 = 0.02;
const MAX_DE_RISK: f64 = 0.9;
const MOMENTUM_RANGE: (f64, f64) = (-1.0, 2.0);
const VALUE_RANGE: (f64, f64) = (0.0, 2.0);

fn bounded(value: f64, (low, high): (f64, f64)) -> f64 {
    value.max(low).min(high)
}

/// Diagnosis-guided mutation.
///
/// Each tag on the parent's report perturbs its own slot fields:
/// - `low_dsr`: alpha weights
/// - `high_mdd`: tighter stop loss, more de-risking
/// - `high_turnover`: longer rebalance interval
/// - `style_drift`: lower concentration cap
///
/// Random draws are taken in that order and only for tags that are present.
pub fn mutate<R: Rng>(genome: &StrategyGenome, report: &EvalReport, rng: &mut R) -> StrategyGenome {
    let generation = genome.generation + 1;
    let parent = &genome.slots;

    let mut alpha_slot = parent.alpha_slot.clone();
    let mut portfolio_slot = parent.portfolio_slot.clone();
    let mut risk_slot = parent.risk_slot.clone();
    let mut execution_slot = parent.execution_slot.clone();

    if report.has_tag(DiagnosisTag::LowDsr) {
        alpha_slot.momentum_w = round_to(
            bounded(alpha_slot.momentum_w + rng.gen_range(-0.1..0.15), MOMENTUM_RANGE),
            3,
        );
        alpha_slot.value_w = round_to(
            bounded(alpha_slot.value_w + rng.gen_range(-0.05..0.1), VALUE_RANGE),
            3,
        );
    }
    if report.has_tag(DiagnosisTag::HighMdd) {
        risk_slot.stop_loss = round_to(
            (risk_slot.stop_loss - rng.gen_range(0.005..0.02)).max(MIN_STOP_LOSS),
            3,
        );
        risk_slot.de_risk = round_to(
            (risk_slot.de_risk + rng.gen_range(0.02..0.08)).min(MAX_DE_RISK),
            3,
        );
    }
    if report.has_tag(DiagnosisTag::HighTurnover) {
        execution_slot.rebalance_days = (execution_slot.rebalance_days + REBALANCE_STEP).min(MAX_REBALANCE_DAYS);
    }
    if report.has_tag(DiagnosisTag::StyleDrift) {
        portfolio_slot.max_weight = round_to(
            (portfolio_slot.max_weight - MAX_WEIGHT_STEP).max(MIN_MAX_WEIGHT),
            3,
        );
    }

    let mut reasons: Vec<&str> = report.diagnosis_tags.iter().map(|t| t.as_str()).collect();
    reasons.sort_unstable();
    reasons.dedup();
    let mut metadata = genome.metadata.clone();
    metadata.insert("mutation_reason".to_string(), json!(reasons));

    StrategyGenome {
        id: StrategyGenome::fresh_id(generation),
        generation,
        parent_ids: vec![genome.id.clone()],
        route: genome.route,
        slots: Slots {
            data_slot: parent.data_slot.clone(),
            alpha_slot,
            portfolio_slot,
            risk_slot,
            execution_slot,
        },
        metadata,
    }
}

/// Compositional crossover: alpha selection from `a`, risk and execution discipline from `b`.
pub fn crossover(a: &StrategyGenome, b: &StrategyGenome) -> StrategyGenome {
    let generation = a.generation.max(b.generation) + 1;
    let mut metadata = a.metadata.clone();
    metadata.insert("crossover".to_string(), json!("alpha<-A,risk_execution<-B"));

    StrategyGenome {
        id: StrategyGenome::fresh_id(generation),
        generation,
        parent_ids: vec![a.id.clone(), b.id.clone()],
        route: a.route,
        slots: Slots {
            data_slot: a.slots.data_slot.clone(),
            alpha_slot: a.slots.alpha_slot.clone(),
            portfolio_slot: a.slots.portfolio_slot.clone(),
            risk_slot: b.slots.risk_slot.clone(),
            execution_slot: b.slots.execution_slot.clone(),
        },
        metadata,
    }
}

/// Copies an elite into the next generation: same route, slots and metadata
/// under a fresh identity, with the elite as its only parent.
pub fn carry_over(elite: &StrategyGenome) -> StrategyGenome {
    let generation = elite.generation + 1;
    StrategyGenome {
        id: StrategyGenome::fresh_id(generation),
        generation,
        parent_ids: vec![elite.id.clone()],
        ..elite.clone()
    }
}

/// Builds the next generation from genomes ranked by fitness, best first.
///
/// The best genome always survives with its parameters unchanged. The top half of the ranking is
/// offered for mutation, and the remaining slots are filled from the elites
/// by crossover of the top two or by cloning.
pub fn evolve_population<R: Rng>(
    ranked: &[(StrategyGenome, EvalReport)],
    config: &EvolutionConfig,
    rng: &mut R,
) -> Vec<StrategyGenome> {
    let elites: Vec<&StrategyGenome> = ranked
        .iter()
        .take(config.elite_count())
        .map(|(genome, _)| genome)
        .collect();
    if elites.is_empty() {
        return Vec::new();
    }

    let mut next_generation = Vec::with_capacity(config.population_size);
    next_generation.push(carry_over(elites[0]));

    for (genome, report) in ranked.iter().take(config.population_size / 2) {
        if rng.gen::<f64>() < config.mutation_rate {
            next_generation.push(mutate(genome, report, rng));
        }
    }

    while next_generation.len() < config.population_size && elites.len() > 1 {
        if rng.gen::<f64>() < config.crossover_rate {
            next_generation.push(crossover(elites[0], elites[1]));
        } else {
            let pick = rng.gen_range(0..elites.len());
            next_generation.push(carry_over(elites[pick]));
        }
    }

    next_generation.truncate(config.population_size);
    next_generation
}
