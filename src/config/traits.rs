use crate::error::EvoquantError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EvoquantError>;
}

pub(crate) fn invalid(section: &str, message: &str) -> EvoquantError {
    EvoquantError::Configuration(format!("[{}] {}", section, message))
}
