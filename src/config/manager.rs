use super::{
    data::DataConfig,
    evolution::EvolutionConfig,
    risk::RiskConfig,
    traits::{invalid, ConfigSection},
};
use crate::error::EvoquantError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything one nightly evolution run needs. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub data: DataConfig,
    pub evolution: EvolutionConfig,
    pub risk: RiskConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: "nightly".to_string(),
            output_dir: PathBuf::from("workspace/runs/evoquant"),
            data: DataConfig::default(),
            evolution: EvolutionConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EvoquantError> {
        if self.run_id.trim().is_empty() {
            return Err(invalid("run", "Run identifier must not be empty"));
        }
        self.data.validate()?;
        self.evolution.validate()?;
        self.risk.validate()?;
        Ok(())
    }

    /// `<output_dir>/<run_id>`, where the report artifact lands.
    pub fn run_dir(&self) -> PathBuf {
        self.output_dir.join(&self.run_id)
    }

    /// `<output_dir>/memory`, shared by every run pointing at the same output location.
    pub fn memory_dir(&self) -> PathBuf {
        self.output_dir.join("memory")
    }
}

/// Loads run configurations from TOML with `EVOQUANT__SECTION__KEY` environment overrides.
pub struct ConfigManager {
    env_prefix: String,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            env_prefix: "EVOQUANT".to_string(),
        }
    }

    pub fn with_env_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: prefix.into(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<RunConfig, EvoquantError> {
        let source = File::from(path.as_ref()).format(FileFormat::Toml).required(true);
        self.build(source)
    }

    pub fn load_from_str(&self, contents: &str) -> Result<RunConfig, EvoquantError> {
        self.build(File::from_str(contents, FileFormat::Toml))
    }

    fn build<S>(&self, source: S) -> Result<RunConfig, EvoquantError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(source)
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("data.markets"),
            )
            .build()
            .map_err(|e| EvoquantError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: RunConfig = settings
            .try_deserialize()
            .map_err(|e| EvoquantError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, config: &RunConfig, path: P) -> Result<(), EvoquantError> {
        let toml_str = toml::to_string_pretty(config)
            .map_err(|e| EvoquantError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| EvoquantError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}
