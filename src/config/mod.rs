//! Chart and batch-run configuration.
//!
//! A batch file is TOML:
//!
//! ```toml
//! universe = [1, 2, 3, 4, 5, 6, 7]
//!
//! [chart]
//! min_pid = 4
//! x_label = "Time (ticks)"
//! y_label = "Execution Ticks / Process"
//!
//! [[run]]
//! log = "test13RR.txt"
//! format = "dense"
//! title = "XV6 P4 RR Evaluation"
//! out = "rr.png"
//! ```
//!
//! Relative `log`/`out` paths are resolved against the config file's directory.

use crate::Result;
use crate::log::TraceFormat;
use crate::model::{DEFAULT_UNIVERSE, ProcessId};
use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Everything the renderer needs for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    /// Only ids `>= min_pid` are drawn.
    pub min_pid: ProcessId,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
    pub out: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Chart settings shared by every run of a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartDefaults {
    pub min_pid: ProcessId,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartDefaults {
    fn default() -> Self {
        Self {
            min_pid: 4,
            x_label: "Time (ticks)".to_string(),
            y_label: "Execution Ticks / Process".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

impl ChartDefaults {
    pub fn chart(&self, title: impl Into<String>, out: impl Into<PathBuf>) -> ChartConfig {
        ChartConfig {
            min_pid: self.min_pid,
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            title: title.into(),
            out: out.into(),
            width: self.width,
            height: self.height,
        }
    }
}

/// One trace log and the chart drawn from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub log: PathBuf,
    /// Detected from content when absent.
    #[serde(default)]
    pub format: Option<TraceFormat>,
    pub title: String,
    pub out: PathBuf,
    /// Overrides `[chart] min_pid` for this run.
    #[serde(default)]
    pub min_pid: Option<ProcessId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_universe")]
    pub universe: Vec<ProcessId>,

    #[serde(default)]
    pub chart: ChartDefaults,

    #[serde(default, rename = "run")]
    pub runs: Vec<RunConfig>,
}

fn default_universe() -> Vec<ProcessId> {
    DEFAULT_UNIVERSE.to_vec()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("parse config file {}", path.display()))?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Reject configs that cannot produce a chart.
    pub fn validate(&self) -> Result<()> {
        if self.runs.is_empty() {
            bail!("config contains no [[run]] entries");
        }
        if self.universe.contains(&0) {
            bail!("process ids must be positive; universe contains 0");
        }

        let mut outs = BTreeSet::new();
        for run in &self.runs {
            if !outs.insert(&run.out) {
                bail!("two runs write the same output {}", run.out.display());
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for run in &mut self.runs {
            if run.log.is_relative() {
                run.log = base.join(&run.log);
            }
            if run.out.is_relative() {
                run.out = base.join(&run.out);
            }
        }
    }

    /// Chart settings for `run`, with its overrides applied.
    pub fn chart_for(&self, run: &RunConfig) -> ChartConfig {
        let mut chart = self.chart.chart(run.title.clone(), run.out.clone());
        if let Some(min_pid) = run.min_pid {
            chart.min_pid = min_pid;
        }
        chart
    }
}
