use crate::{
    config::RunConfig,
    data::{DataBundle, MarketFactors},
    engines::evaluation::Portfolio,
    error::{EvoquantError, Result},
    types::{AlphaSlot, BacktestResult, StrategyGenome},
};

/// Per-period return ceiling applied after the timing scale
const MAX_PERIOD_RETURN: f64 = 0.2;
const MIN_TIMING: f64 = 0.1;
const MAX_TIMING: f64 = 1.2;

fn clip(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Cross-market sector rotation with a volatility timing gate.
pub struct Backtester {
    markets: Vec<String>,
    periods: usize,
}

impl Backtester {
    pub fn new(markets: Vec<String>, periods: usize) -> Self {
        Self { markets, periods }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.data.markets.clone(), config.data.periods)
    }

    pub fn run(&self, genome: &StrategyGenome, data: &DataBundle) -> Result<BacktestResult> {
        let factors = data.select(&self.markets)?;
        if let Some(short) = factors.iter().find(|f| f.len() < self.periods) {
            return Err(EvoquantError::Data(format!(
                "Market '{}' has {} periods of data, {} required",
                short.market,
                short.len(),
                self.periods
            )));
        }
        Self::check_genome(genome)?;

        let alpha = &genome.slots.alpha_slot;
        let risk = &genome.slots.risk_slot;
        let execution = &genome.slots.execution_slot;
        let max_weight = genome.slots.portfolio_slot.max_weight;
        let rebalance_days = execution.rebalance_days.max(1) as usize;

        let mut portfolio = Portfolio::new(factors.len());

        for t in 0..self.periods {
            let scores: Vec<f64> = factors.iter().map(|f| alpha_score(alpha, f, t)).collect();
            let weights = Portfolio::target_weights(&scores, max_weight);
            let timing = timing_multiplier(&factors, t, risk.de_risk);

            let mut period_return: f64 = weights
                .iter()
                .zip(&factors)
                .map(|(w, f)| w * f.returns[t])
                .sum();

            if t % rebalance_days == 0 {
                period_return -= portfolio.rebalance(&weights, execution.cost_bps);
            }

            let period_return = clip(period_return * timing, -risk.stop_loss, MAX_PERIOD_RETURN);
            portfolio.record_period(weights, period_return);
        }

        Ok(portfolio.into_result())
    }

    fn check_genome(genome: &StrategyGenome) -> Result<()> {
        let slots = &genome.slots;
        if !(slots.risk_slot.stop_loss > 0.0 && slots.risk_slot.stop_loss <= MAX_PERIOD_RETURN) {
            return Err(EvoquantError::Backtest(format!(
                "Genome {} has stop loss {} outside (0, {}]",
                genome.id, slots.risk_slot.stop_loss, MAX_PERIOD_RETURN
            )));
        }
        if !(slots.portfolio_slot.max_weight > 0.0) {
            return Err(EvoquantError::Backtest(format!(
                "Genome {} has non-positive max weight {}",
                genome.id, slots.portfolio_slot.max_weight
            )));
        }
        Ok(())
    }
}

fn alpha_score(alpha: &AlphaSlot, factors: &MarketFactors, t: usize) -> f64 {
    alpha.momentum_w * factors.momentum[t]
        + alpha.value_w * factors.value[t]
        + alpha.volatility_w * factors.volatility[t]
        + alpha.flow_w * factors.flow[t]
}

/// Scales exposure down as average cross-market volatility rises.
fn timing_multiplier(factors: &[&MarketFactors], t: usize, de_risk: f64) -> f64 {
    let avg_vol = factors.iter().map(|f| f.volatility[t]).sum::<f64>() / factors.len().max(1) as f64;
    clip(1.0 - de_risk * clip(avg_vol, 0.0, 1.0), MIN_TIMING, MAX_TIMING)
}
