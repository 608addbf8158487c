use crate::error::Result;
use crate::types::{EvalReport, MemoryCounts, StrategyGenome};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// The three append-only logs kept under a memory directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStream {
    AlphaZoo,
    HallOfShame,
    MetaRules,
}

impl MemoryStream {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::AlphaZoo => "alpha_zoo.jsonl",
            Self::HallOfShame => "hall_of_shame.jsonl",
            Self::MetaRules => "meta_rules.jsonl",
        }
    }
}

#[derive(Serialize)]
struct GenomeRecord<'a> {
    strategy: &'a StrategyGenome,
    report: &'a EvalReport,
}

/// A derived design heuristic with its support score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRule {
    pub rule: String,
    pub support: f64,
}

/// JSONL-backed alpha zoo, hall of shame and meta-rule log.
///
/// Records are only ever appended. Each record is written with a single
/// `write_all` of a complete line, so runs sharing a memory directory may
/// interleave lines but never split one. There is no locking.
pub struct MemoryStore {
    base_dir: PathBuf,
}

impl MemoryStore {
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path(&self, stream: MemoryStream) -> PathBuf {
        self.base_dir.join(stream.file_name())
    }

    pub fn record_success(&self, genome: &StrategyGenome, report: &EvalReport) -> Result<()> {
        self.append(MemoryStream::AlphaZoo, &GenomeRecord { strategy: genome, report })
    }

    pub fn record_failure(&self, genome: &StrategyGenome, report: &EvalReport) -> Result<()> {
        self.append(MemoryStream::HallOfShame, &GenomeRecord { strategy: genome, report })
    }

    pub fn record_meta_rule(&self, rule: &str, support: f64) -> Result<()> {
        self.append(
            MemoryStream::MetaRules,
            &MetaRule {
                rule: rule.to_string(),
                support,
            },
        )
    }

    pub fn summarize_counts(&self) -> Result<MemoryCounts> {
        Ok(MemoryCounts {
            alpha_zoo: self.count(MemoryStream::AlphaZoo)?,
            hall_of_shame: self.count(MemoryStream::HallOfShame)?,
            meta_rules: self.count(MemoryStream::MetaRules)?,
        })
    }

    fn append<T: Serialize>(&self, stream: MemoryStream, payload: &T) -> Result<()> {
        let mut line = serde_json::to_string(payload)?;
        line.push('\n');

        let path = self.path(stream);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        debug!("Appended {} bytes to {}", line.len(), path.display());
        Ok(())
    }

    fn count(&self, stream: MemoryStream) -> Result<usize> {
        let path = self.path(stream);
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(File::open(path)?);
        let mut lines = 0;
        for line in reader.lines() {
            line?;
            lines += 1;
        }
        Ok(lines)
    }
}
