pub mod traits;
pub mod data;
pub mod evolution;
pub mod risk;
pub mod manager;

pub use manager::{ConfigManager, RunConfig};
pub use data::DataConfig;
pub use evolution::EvolutionConfig;
pub use risk::RiskConfig;
pub use traits::ConfigSection;
