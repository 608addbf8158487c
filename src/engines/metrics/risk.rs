// src/engines/metrics/risk.rs

/// Series with fewer returns than this have no regime robustness
const MIN_REGIME_LEN: usize = 6;

pub struct RiskMetrics;

impl RiskMetrics {
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation, 0 for fewer than two values
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }

        let mean = Self::mean(values);
        let variance = values.iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>() / values.len() as f64;

        variance.sqrt()
    }

    /// Largest peak-to-trough decline of the compounded equity curve, as a fraction
    pub fn max_drawdown(returns: &[f64]) -> f64 {
        let mut equity = 1.0;
        let mut peak = 1.0;
        let mut max_dd = 0.0;

        for &r in returns {
            equity *= 1.0 + r;
            if equity > peak {
                peak = equity;
            }
            let dd = if peak > 0.0 { (peak - equity) / peak } else { 0.0 };
            if dd > max_dd {
                max_dd = dd;
            }
        }

        max_dd
    }

    /// Stability of the mean return across three contiguous regimes, in [0, 1].
    ///
    /// The last segment absorbs the remainder when the length is not a
    /// multiple of three.
    pub fn regime_robustness(returns: &[f64]) -> f64 {
        if returns.len() < MIN_REGIME_LEN {
            return 0.0;
        }

        let chunk = returns.len() / 3;
        let segment_means = [
            Self::mean(&returns[..chunk]),
            Self::mean(&returns[chunk..2 * chunk]),
            Self::mean(&returns[2 * chunk..]),
        ];
        let m = Self::mean(&segment_means);
        let s = Self::std_dev(&segment_means);

        (1.0 - s / (m.abs() + 1e-9)).max(0.0)
    }
}
