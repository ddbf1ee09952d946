//! Ordination options and engine configuration
//!
//! Both structs deserialize from JSON with every field optional, falling back
//! to the engine's documented defaults.

use crate::error::{DecoranaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine limit on extracted axes
pub const MAX_AXES: usize = 4;

/// Type of analysis performed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    /// Detrending by segments (DCA)
    #[default]
    Detrended,
    /// Basic reciprocal averaging, no detrending
    ReciprocalAveraging,
}

/// How species labels are shortened to the 8-character field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Left-justified cut; collisions are rejected
    #[default]
    Truncate,
    /// Genus/epithet abbreviation (see `utils::cep_names`)
    CepAbbreviate,
}

/// Options passed to the engine through the parameter file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdinationOptions {
    /// Convergence tolerance for the eigenvector iteration
    pub tolerance: f64,
    /// Iteration limit per axis
    pub max_iterations: u32,
    /// Number of axes to extract (1..=4)
    pub axes: usize,
    /// Non-linear rescaling of axes
    pub rescale: bool,
    /// Rescaling cycles when `rescale` is set
    pub rescaling_cycles: u32,
    /// Number of detrending segments
    pub segments: u32,
    /// Shortest gradient length that is still rescaled
    pub shortest_gradient: f64,
    /// Downweight rare species
    pub downweight_rare: bool,
    pub analysis: Analysis,
    /// Title line of the exchange file
    pub title: String,
    /// Decimal places written for non-integer abundances
    pub decimals: usize,
    pub label_policy: LabelPolicy,
}

impl Default for OrdinationOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.000005,
            max_iterations: 999,
            axes: MAX_AXES,
            rescale: true,
            rescaling_cycles: 4,
            segments: 26,
            shortest_gradient: 0.0,
            downweight_rare: false,
            analysis: Analysis::Detrended,
            title: "decorana_rs".to_string(),
            decimals: 2,
            label_policy: LabelPolicy::Truncate,
        }
    }
}

impl OrdinationOptions {
    /// Load options from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {:?}", path))?;
        let options: OrdinationOptions = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse options JSON")?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_AXES).contains(&self.axes) {
            return Err(DecoranaError::Config(format!(
                "axes must be between 1 and {} (got {})",
                MAX_AXES, self.axes
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(DecoranaError::Config(format!(
                "tolerance must be positive (got {})",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(DecoranaError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.analysis == Analysis::Detrended && self.segments < 2 {
            return Err(DecoranaError::Config(format!(
                "detrending needs at least 2 segments (got {})",
                self.segments
            )));
        }
        if !self.shortest_gradient.is_finite() || self.shortest_gradient < 0.0 {
            return Err(DecoranaError::Config(format!(
                "shortest_gradient must be non-negative (got {})",
                self.shortest_gradient
            )));
        }
        if self.decimals > 6 {
            return Err(DecoranaError::Config(format!(
                "decimals must be at most 6 (got {})",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Where the engine executable comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineSource {
    /// Prebuilt executable at a fixed path
    Binary { path: PathBuf },
    /// Executable looked up by name on PATH
    Search { name: String },
    /// Fortran source compiled into each invocation's workspace
    Fortran { source: PathBuf, compiler: String },
}

impl Default for EngineSource {
    fn default() -> Self {
        EngineSource::Search {
            name: "decorana".to_string(),
        }
    }
}

/// Which engine output file the scores are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Labelled printed report with section markers
    PrintedReport,
    /// Positional scores file without labels; eigenvalues still come from
    /// the printed report when it carries them
    #[default]
    ScoresFile,
}

/// Engine location, process limits and file name conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub source: EngineSource,
    /// Wall-clock limit in seconds (no limit when `None`)
    pub timeout_secs: Option<f64>,
    /// Directory under which per-invocation workspaces are created
    pub work_root: Option<PathBuf>,
    pub exchange_file: String,
    pub report_file: String,
    pub scores_file: String,
    pub report_source: ReportSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source: EngineSource::default(),
            timeout_secs: None,
            work_root: None,
            exchange_file: "cep.dat".to_string(),
            report_file: "decorana.prt".to_string(),
            scores_file: "decorana.out".to_string(),
            report_source: ReportSource::ScoresFile,
        }
    }
}

impl EngineConfig {
    /// Use a prebuilt engine executable
    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self {
            source: EngineSource::Binary { path: path.into() },
            ..Self::default()
        }
    }

    /// Compile the engine from Fortran source with the given compiler
    pub fn fortran(source: impl Into<PathBuf>, compiler: impl Into<String>) -> Self {
        Self {
            source: EngineSource::Fortran {
                source: source.into(),
                compiler: compiler.into(),
            },
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs_f64)
    }

    /// Load engine configuration from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse engine config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(DecoranaError::Config(format!(
                    "timeout_secs must be positive (got {})",
                    secs
                )));
            }
        }

        let names = [&self.exchange_file, &self.report_file, &self.scores_file];
        for name in names {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(DecoranaError::Config(format!(
                    "engine file names must be plain file names (got '{}')",
                    name
                )));
            }
        }
        if self.exchange_file == self.report_file || self.exchange_file == self.scores_file {
            return Err(DecoranaError::Config(
                "exchange file name must differ from the engine output names".to_string(),
            ));
        }
        Ok(())
    }
}
