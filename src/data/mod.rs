pub mod provider;

pub use provider::{DataBundle, DataProvider, FactorKind, MarketFactors};
