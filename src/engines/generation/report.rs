use crate::error::Result;
use crate::types::EvalReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "report.json";

/// On-disk summary of one run: every report, best fitness first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub top_k: usize,
    pub reports: Vec<EvalReport>,
}

impl RunReport {
    /// Writes `<run_dir>/report.json`, creating the directory if needed.
    pub fn write(&self, run_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(run_dir)?;
        let path = run_dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
