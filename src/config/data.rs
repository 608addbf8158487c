use super::traits::{invalid, ConfigSection};
use crate::error::EvoquantError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which markets to synthesize and for how many periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub markets: Vec<String>,
    pub periods: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            markets: vec!["cn_sector".to_string(), "us_sector".to_string()],
            periods: 252,
        }
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<(), EvoquantError> {
        if self.markets.is_empty() {
            return Err(invalid(Self::section_name(), "At least one market is required"));
        }
        let mut seen = HashSet::new();
        for market in &self.markets {
            if market.trim().is_empty() {
                return Err(invalid(Self::section_name(), "Market identifiers must not be blank"));
            }
            if !seen.insert(market.as_str()) {
                return Err(invalid(
                    Self::section_name(),
                    &format!("Duplicate market identifier '{}'", market),
                ));
            }
        }
        if self.periods == 0 {
            return Err(invalid(Self::section_name(), "Period count must be positive"));
        }
        Ok(())
    }
}
