use crate::config::RunConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Research route a genome was planned under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Macro,
    Fundamental,
    Quant,
    Event,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Macro, Route::Fundamental, Route::Quant, Route::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Macro => "macro",
            Self::Fundamental => "fundamental",
            Self::Quant => "quant",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    Zscore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSlot {
    pub normalize: Normalization,
    pub winsor: f64,
}

impl Default for DataSlot {
    fn default() -> Self {
        Self {
            normalize: Normalization::Zscore,
            winsor: 0.03,
        }
    }
}

/// Linear weights applied to the four non-return factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaSlot {
    pub route: Route,
    pub momentum_w: f64,
    pub value_w: f64,
    pub volatility_w: f64,
    pub flow_w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSlot {
    pub max_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSlot {
    pub stop_loss: f64,
    pub de_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSlot {
    pub rebalance_days: u32,
    pub cost_bps: f64,
}

/// The five parameter groups of a strategy genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slots {
    pub data_slot: DataSlot,
    pub alpha_slot: AlphaSlot,
    pub portfolio_slot: PortfolioSlot,
    pub risk_slot: RiskSlot,
    pub execution_slot: ExecutionSlot,
}

/// One trading-strategy parameterization.
///
/// Genomes are values: planners and operators build new ones, nothing edits an
/// existing genome after it has been created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyGenome {
    pub id: String,
    pub generation: usize,
    pub parent_ids: Vec<String>,
    pub route: Route,
    pub slots: Slots,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl StrategyGenome {
    /// `g<generation>-<8 hex chars>`. The token comes from the OS, not the run seed.
    pub fn fresh_id(generation: usize) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        format!("g{}-{}", generation, &token[..8])
    }
}

/// Daily return series of one genome replayed over the data bundle
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub daily_returns: Vec<f64>,
    pub turnover: f64,
    /// Cumulative turnover after each period
    pub turnover_curve: Vec<f64>,
    /// Portfolio weights per period, in market order
    pub weight_history: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub arr: f64,
    pub vol: f64,
    pub sharpe: f64,
    pub dsr: f64,
    pub mdd: f64,
    pub rank_ic: f64,
    pub turnover: f64,
    pub regime_robustness: f64,
    pub fitness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisTag {
    LowDsr,
    HighMdd,
    HighTurnover,
    StyleDrift,
}

impl DiagnosisTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowDsr => "low_dsr",
            Self::HighMdd => "high_mdd",
            Self::HighTurnover => "high_turnover",
            Self::StyleDrift => "style_drift",
        }
    }
}

impl fmt::Display for DiagnosisTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    MddLimitExceeded,
    TurnoverLimitExceeded,
    SuspiciousAlphaWeight,
}

impl RiskReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MddLimitExceeded => "mdd_limit_exceeded",
            Self::TurnoverLimitExceeded => "turnover_limit_exceeded",
            Self::SuspiciousAlphaWeight => "suspicious_alpha_weight",
        }
    }
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return attribution by source. Not derived from the backtest yet, every
/// report carries the same fixed split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributionSummary {
    pub alpha_contrib: f64,
    pub timing_contrib: f64,
    pub risk_contrib: f64,
}

impl AttributionSummary {
    pub fn placeholder() -> Self {
        Self {
            alpha_contrib: 0.6,
            timing_contrib: 0.25,
            risk_contrib: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub strategy_id: String,
    pub metrics: EvalMetrics,
    pub diagnosis_tags: Vec<DiagnosisTag>,
    pub attribution_summary: AttributionSummary,
    pub passed_risk_gate: bool,
    pub risk_reasons: Vec<RiskReason>,
}

impl EvalReport {
    pub fn has_tag(&self, tag: DiagnosisTag) -> bool {
        self.diagnosis_tags.contains(&tag)
    }

    pub fn has_reason(&self, reason: RiskReason) -> bool {
        self.risk_reasons.contains(&reason)
    }
}

/// Line counts of the three memory streams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounts {
    pub alpha_zoo: usize,
    pub hall_of_shame: usize,
    pub meta_rules: usize,
}

/// Final aggregate of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionResult {
    pub config: RunConfig,
    pub timestamp: DateTime<Utc>,
    pub top_candidates: Vec<EvalReport>,
    pub reports: Vec<EvalReport>,
    pub memory_updates: MemoryCounts,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
