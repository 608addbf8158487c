use crate::config::RunConfig;
use crate::error::{EvoquantError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Persistence of each factor recurrence
const AR_COEFFICIENT: f64 = 0.4;

/// The five factor series synthesized for every market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Returns,
    Momentum,
    Value,
    Volatility,
    Flow,
}

impl FactorKind {
    /// Generation order inside one market. Changing it changes every series.
    pub const ALL: [FactorKind; 5] = [
        FactorKind::Returns,
        FactorKind::Momentum,
        FactorKind::Value,
        FactorKind::Volatility,
        FactorKind::Flow,
    ];

    /// `(drift, noise)` of the recurrence
    pub fn parameters(&self) -> (f64, f64) {
        match self {
            Self::Returns => (0.0006, 0.018),
            Self::Momentum => (0.02, 0.2),
            Self::Value => (0.0, 0.15),
            Self::Volatility => (0.1, 0.3),
            Self::Flow => (0.01, 0.22),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Returns => "returns",
            Self::Momentum => "momentum",
            Self::Value => "value",
            Self::Volatility => "volatility",
            Self::Flow => "flow",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketFactors {
    pub market: String,
    pub returns: Vec<f64>,
    pub momentum: Vec<f64>,
    pub value: Vec<f64>,
    pub volatility: Vec<f64>,
    pub flow: Vec<f64>,
}

impl MarketFactors {
    pub fn series(&self, kind: FactorKind) -> &[f64] {
        match kind {
            FactorKind::Returns => &self.returns,
            FactorKind::Momentum => &self.momentum,
            FactorKind::Value => &self.value,
            FactorKind::Volatility => &self.volatility,
            FactorKind::Flow => &self.flow,
        }
    }

    /// Length of the shortest factor series
    pub fn len(&self) -> usize {
        FactorKind::ALL
            .iter()
            .map(|kind| self.series(*kind).len())
            .min()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-market factor series for one run, in configured market order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataBundle {
    markets: Vec<MarketFactors>,
}

impl DataBundle {
    pub fn new(markets: Vec<MarketFactors>) -> Self {
        Self { markets }
    }

    /// Synthesizes the bundle described by `config.data` with the run seed.
    pub fn from_config(config: &RunConfig) -> Self {
        DataProvider::new(config.evolution.seed).generate(&config.data.markets, config.data.periods)
    }

    pub fn get(&self, market: &str) -> Option<&MarketFactors> {
        self.markets.iter().find(|m| m.market == market)
    }

    /// Looks up every requested market, failing on the first one the bundle lacks.
    pub fn select(&self, markets: &[String]) -> Result<Vec<&MarketFactors>> {
        markets
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    EvoquantError::Data(format!("Market '{}' is missing from the data bundle", name))
                })
            })
            .collect()
    }

    pub fn markets(&self) -> &[MarketFactors] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

/// Deterministic synthetic market data.
///
/// Each provider owns its own generator seeded from the run seed, so data
/// generation never shares a random stream with population planning or
/// evolution.
pub struct DataProvider {
    rng: StdRng,
}

impl DataProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(mut self, markets: &[String], periods: usize) -> DataBundle {
        let markets = markets
            .iter()
            .map(|market| self.market_factors(market, periods))
            .collect();
        DataBundle::new(markets)
    }

    fn market_factors(&mut self, market: &str, periods: usize) -> MarketFactors {
        let returns = self.series(FactorKind::Returns, periods);
        let momentum = self.series(FactorKind::Momentum, periods);
        let value = self.series(FactorKind::Value, periods);
        let volatility = self
            .series(FactorKind::Volatility, periods)
            .into_iter()
            .map(f64::abs)
            .collect();
        let flow = self.series(FactorKind::Flow, periods);

        MarketFactors {
            market: market.to_string(),
            returns,
            momentum,
            value,
            volatility,
            flow,
        }
    }

    fn series(&mut self, kind: FactorKind, periods: usize) -> Vec<f64> {
        let (drift, noise) = kind.parameters();
        let mut out = Vec::with_capacity(periods);
        let mut value = 0.0;
        for _ in 0..periods {
            value = drift + AR_COEFFICIENT * value + self.rng.gen_range(-noise..noise);
            out.push(value);
        }
        out
    }
}
