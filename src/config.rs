//! Executor configuration.
//!
//! Loaded from JSON or built in code; every field has a default.
//!
//! ```json
//! { "mode": { "type": "parallel", "threads": 4 }, "profile": true }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the shard phase is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecMode {
    /// Shards one after another on the calling thread.
    Sequential,
    /// Shards on a Rayon pool; `None` threads uses the global pool.
    Parallel {
        #[serde(default)]
        threads: Option<usize>,
    },
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub mode: ExecMode,
    /// Produce a profile report alongside the result.
    pub profile: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self { mode: ExecMode::default(), profile: false }
    }
}

impl ExecConfig {
    pub fn sequential() -> Self {
        Self { mode: ExecMode::Sequential, ..Self::default() }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    /// Worker threads the shard phase will use.
    pub fn effective_threads(&self) -> usize {
        match self.mode {
            ExecMode::Sequential => 1,
            ExecMode::Parallel { threads } => threads.unwrap_or_else(num_cpus::get).max(1),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let ExecMode::Parallel { threads: Some(0) } = self.mode {
            bail!("parallel mode requires at least one thread");
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).context("parsing executor config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading config {}", path.display()))
    }
}
