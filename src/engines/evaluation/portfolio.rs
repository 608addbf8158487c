use crate::types::BacktestResult;

/// Below this total score mass the allocation falls back to equal weights
const SCORE_EPSILON: f64 = 1e-9;

/// Cross-market allocation state of a single backtest.
///
/// Tracks the weights held since the last rebalance, the cumulative turnover,
/// and one entry per simulated period in each of the history vectors.
pub struct Portfolio {
    pub held_weights: Vec<f64>,
    pub turnover: f64,
    pub daily_returns: Vec<f64>,
    pub turnover_curve: Vec<f64>,
    pub weight_history: Vec<Vec<f64>>,
}

impl Portfolio {
    /// Starts fully invested with equal weights.
    pub fn new(num_markets: usize) -> Self {
        let initial = if num_markets == 0 {
            Vec::new()
        } else {
            vec![1.0 / num_markets as f64; num_markets]
        };
        Self {
            held_weights: initial,
            turnover: 0.0,
            daily_returns: Vec::new(),
            turnover_curve: Vec::new(),
            weight_history: Vec::new(),
        }
    }

    /// Converts alpha scores into long-only weights proportional to `|score|`,
    /// summing to 1.
    ///
    /// When `max_weight` can hold a fully invested book (`max_weight * n >= 1`)
    /// the excess above the cap is redistributed over the uncapped markets.
    /// Otherwise each share is clipped to `max_weight` and the clipped shares
    /// are renormalized, so larger scores still receive larger weights.
    pub fn target_weights(scores: &[f64], max_weight: f64) -> Vec<f64> {
        let n = scores.len();
        if n == 0 {
            return Vec::new();
        }
        let magnitude: Vec<f64> = scores.iter().map(|s| s.abs()).collect();
        if max_weight * n as f64 >= 1.0 {
            Self::water_fill(&magnitude, max_weight)
        } else {
            Self::clip_and_renormalize(&magnitude, max_weight)
        }
    }

    fn clip_and_renormalize(magnitude: &[f64], max_weight: f64) -> Vec<f64> {
        let n = magnitude.len();
        let total: f64 = magnitude.iter().sum();
        let raw: Vec<f64> = magnitude
            .iter()
            .map(|m| (m / (total + SCORE_EPSILON)).max(0.0).min(max_weight))
            .collect();
        let raw_total: f64 = raw.iter().sum();
        if raw_total <= SCORE_EPSILON {
            return vec![1.0 / n as f64; n];
        }
        raw.iter().map(|r| r / raw_total).collect()
    }

    fn water_fill(magnitude: &[f64], cap: f64) -> Vec<f64> {
        let n = magnitude.len();
        let mut weights = vec![0.0; n];
        let mut capped = vec![false; n];
        let mut remaining = 1.0;

        loop {
            let free: Vec<usize> = (0..n).filter(|&i| !capped[i]).collect();
            if free.is_empty() {
                break;
            }
            let free_mass: f64 = free.iter().map(|&i| magnitude[i]).sum();
            let share = |i: usize| {
                if free_mass > SCORE_EPSILON {
                    remaining * magnitude[i] / free_mass
                } else {
                    remaining / free.len() as f64
                }
            };

            let over: Vec<usize> = free.iter().copied().filter(|&i| share(i) > cap).collect();
            if over.is_empty() {
                for &i in &free {
                    weights[i] = share(i);
                }
                break;
            }
            for i in over {
                capped[i] = true;
                weights[i] = cap;
                remaining -= cap;
            }
        }

        weights
    }

    /// Moves the held weights to `target` and returns the transaction cost as a
    /// return drag.
    pub fn rebalance(&mut self, target: &[f64], cost_bps: f64) -> f64 {
        let step_turnover: f64 = target
            .iter()
            .zip(&self.held_weights)
            .map(|(new, old)| (new - old).abs())
            .sum();
        self.turnover += step_turnover;
        self.held_weights = target.to_vec();
        step_turnover * cost_bps / 10_000.0
    }

    pub fn record_period(&mut self, weights: Vec<f64>, period_return: f64) {
        self.daily_returns.push(period_return);
        self.turnover_curve.push(self.turnover);
        self.weight_history.push(weights);
    }

    pub fn into_result(self) -> BacktestResult {
        BacktestResult {
            daily_returns: self.daily_returns,
            turnover: self.turnover,
            turnover_curve: self.turnover_curve,
            weight_history: self.weight_history,
        }
    }
}
