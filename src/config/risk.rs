use super::traits::{invalid, ConfigSection};
use crate::error::EvoquantError;
use serde::{Deserialize, Serialize};

/// Absolute limits enforced by the risk gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub mdd_limit: f64,
    pub turnover_limit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            mdd_limit: 0.2,
            turnover_limit: 2.5,
        }
    }
}

impl ConfigSection for RiskConfig {
    fn section_name() -> &'static str {
        "risk"
    }

    fn validate(&self) -> Result<(), EvoquantError> {
        if !self.mdd_limit.is_finite() || self.mdd_limit <= 0.0 {
            return Err(invalid(
                Self::section_name(),
                "Max drawdown limit must be a positive number",
            ));
        }
        if !self.turnover_limit.is_finite() || self.turnover_limit <= 0.0 {
            return Err(invalid(
                Self::section_name(),
                "Turnover limit must be a positive number",
            ));
        }
        Ok(())
    }
}
