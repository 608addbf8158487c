// src/engines/metrics/engine.rs
use crate::engines::metrics::RiskMetrics;
use crate::types::{AttributionSummary, BacktestResult, DiagnosisTag, EvalMetrics, EvalReport};

const TRADING_DAYS: f64 = 252.0;
/// Flat haircut standing in for a proper deflated Sharpe correction
const DSR_OFFSET: f64 = 0.35;

const LOW_DSR: f64 = 0.2;
const HIGH_MDD: f64 = 0.2;
const HIGH_TURNOVER: f64 = 2.5;
const STYLE_DRIFT: f64 = 0.35;

/// Weights of the fitness combination
#[derive(Debug, Clone, Copy)]
pub struct FitnessWeights {
    pub dsr: f64,
    pub rank_ic: f64,
    pub regime: f64,
    pub turnover: f64,
    pub mdd: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            dsr: 0.35,
            rank_ic: 0.25,
            regime: 0.25,
            turnover: 0.1,
            mdd: 0.05,
        }
    }
}

/// Turns backtest returns into metrics, fitness and diagnosis tags.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    weights: FitnessWeights,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&self, strategy_id: &str, result: &BacktestResult) -> EvalReport {
        let metrics = self.calculate_all(result);
        let diagnosis_tags = Self::diagnose(&metrics);

        EvalReport {
            strategy_id: strategy_id.to_string(),
            metrics,
            diagnosis_tags,
            attribution_summary: AttributionSummary::placeholder(),
            passed_risk_gate: true,
            risk_reasons: Vec::new(),
        }
    }

    pub fn calculate_all(&self, result: &BacktestResult) -> EvalMetrics {
        let returns = &result.daily_returns;
        let avg = RiskMetrics::mean(returns);
        let vol = RiskMetrics::std_dev(returns);

        let arr = avg * TRADING_DAYS;
        let sharpe = avg / (vol + 1e-9) * TRADING_DAYS.sqrt();
        let dsr = sharpe - DSR_OFFSET;
        let mdd = RiskMetrics::max_drawdown(returns);
        let rank_ic = avg / (vol + 1e-6);
        let regime_robustness = RiskMetrics::regime_robustness(returns);
        let turnover = result.turnover;

        let mut metrics = EvalMetrics {
            arr,
            vol,
            sharpe,
            dsr,
            mdd,
            rank_ic,
            turnover,
            regime_robustness,
            fitness: 0.0,
        };
        metrics.fitness = self.fitness(&metrics);
        metrics
    }

    pub fn fitness(&self, m: &EvalMetrics) -> f64 {
        let w = &self.weights;
        w.dsr * m.dsr + w.rank_ic * m.rank_ic + w.regime * m.regime_robustness
            - w.turnover * m.turnover
            - w.mdd * m.mdd
    }

    pub fn diagnose(m: &EvalMetrics) -> Vec<DiagnosisTag> {
        let mut tags = Vec::new();
        if m.dsr < LOW_DSR {
            tags.push(DiagnosisTag::LowDsr);
        }
        if m.mdd > HIGH_MDD {
            tags.push(DiagnosisTag::HighMdd);
        }
        if m.turnover > HIGH_TURNOVER {
            tags.push(DiagnosisTag::HighTurnover);
        }
        if m.regime_robustness < STYLE_DRIFT {
            tags.push(DiagnosisTag::StyleDrift);
        }
        tags
    }
}
