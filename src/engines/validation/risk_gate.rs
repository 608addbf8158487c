use crate::config::RiskConfig;
use crate::types::{EvalReport, RiskReason, StrategyGenome};

/// Momentum weights above this are treated as a sign of a degenerate search
pub const SUSPICIOUS_MOMENTUM_WEIGHT: f64 = 1.2;

/// Absolute pass/fail filter applied after evaluation.
///
/// Failing the gate is ordinary report data, never an error.
#[derive(Debug, Clone)]
pub struct RiskGate {
    limits: RiskConfig,
}

impl RiskGate {
    pub fn new(limits: &RiskConfig) -> Self {
        Self {
            limits: limits.clone(),
        }
    }

    /// Returns a copy of `report` with the gate outcome filled in; `report` itself is left as is.
    pub fn scan(&self, genome: &StrategyGenome, report: &EvalReport) -> EvalReport {
        let reasons = self.reasons(genome, report);
        EvalReport {
            passed_risk_gate: reasons.is_empty(),
            risk_reasons: reasons,
            ..report.clone()
        }
    }

    fn reasons(&self, genome: &StrategyGenome, report: &EvalReport) -> Vec<RiskReason> {
        let mut reasons = Vec::new();
        if report.metrics.mdd > self.limits.mdd_limit {
            reasons.push(RiskReason::MddLimitExceeded);
        }
        if report.metrics.turnover > self.limits.turnover_limit {
            reasons.push(RiskReason::TurnoverLimitExceeded);
        }
        if genome.slots.alpha_slot.momentum_w > SUSPICIOUS_MOMENTUM_WEIGHT {
            reasons.push(RiskReason::SuspiciousAlphaWeight);
        }
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::engines::generation::planner::PopulationPlanner;
    use crate::types::{AttributionSummary, EvalMetrics};

    fn report(mdd: f64, turnover: f64) -> EvalReport {
        EvalReport {
            strategy_id: "g0-test".to_string(),
            metrics: EvalMetrics {
                arr: 0.1,
                vol: 0.01,
                sharpe: 1.0,
                dsr: 0.65,
                mdd,
                rank_ic: 0.05,
                turnover,
                regime_robustness: 0.8,
                fitness: 0.4,
            },
            diagnosis_tags: Vec::new(),
            attribution_summary: AttributionSummary::placeholder(),
            passed_risk_gate: true,
            risk_reasons: Vec::new(),
        }
    }

    fn genome() -> StrategyGenome {
        let config = RunConfig::new("gate");
        PopulationPlanner::from_config(&config).build_initial_population(&config)[0].clone()
    }

    #[test]
    fn within_limits_passes() {
        let gate = RiskGate::new(&RiskConfig::default());
        let scanned = gate.scan(&genome(), &report(0.1, 1.0));
        assert!(scanned.passed_risk_gate);
        assert!(scanned.risk_reasons.is_empty());
    }

    #[test]
    fn each_breach_adds_its_reason() {
        let gate = RiskGate::new(&RiskConfig::default());

        let scanned = gate.scan(&genome(), &report(0.35, 1.0));
        assert!(!scanned.passed_risk_gate);
        assert_eq!(scanned.risk_reasons, vec![RiskReason::MddLimitExceeded]);

        let scanned = gate.scan(&genome(), &report(0.1, 4.0));
        assert!(!scanned.passed_risk_gate);
        assert_eq!(scanned.risk_reasons, vec![RiskReason::TurnoverLimitExceeded]);

        let scanned = gate.scan(&genome(), &report(0.35, 4.0));
        assert!(scanned.has_reason(RiskReason::MddLimitExceeded));
        assert!(scanned.has_reason(RiskReason::TurnoverLimitExceeded));
    }

    #[test]
    fn oversized_momentum_weight_is_suspicious() {
        let mut g = genome();
        g.slots.alpha_slot.momentum_w = 1.25;
        let scanned = RiskGate::new(&RiskConfig::default()).scan(&g, &report(0.0, 0.0));
        assert!(!scanned.passed_risk_gate);
        assert_eq!(scanned.risk_reasons[0].as_str(), "suspicious_alpha_weight");
    }

    #[test]
    fn scan_leaves_input_report_untouched() {
        let original = report(0.5, 5.0);
        let scanned = RiskGate::new(&RiskConfig::default()).scan(&genome(), &original);
        assert!(original.passed_risk_gate);
        assert!(original.risk_reasons.is_empty());
        assert_eq!(scanned.metrics, original.metrics);
        assert_eq!(scanned.strategy_id, original.strategy_id);
    }

    #[test]
    fn rescanning_replaces_previous_outcome() {
        let gate = RiskGate::new(&RiskConfig::default());
        let failed = gate.scan(&genome(), &report(0.5, 0.0));
        let lenient = RiskGate::new(&RiskConfig {
            mdd_limit: 0.9,
            turnover_limit: 2.5,
        });
        let rescanned = lenient.scan(&genome(), &failed);
        assert!(rescanned.passed_risk_gate);
        assert!(rescanned.risk_reasons.is_empty());
    }
}
