//! Error taxonomy for the ordination pipeline
//!
//! Three groups, matching who has to act on them:
//! - input errors (the caller must fix the table or the options)
//! - engine errors (environment or external process problems, surfaced with
//!   the captured process output)
//! - report errors (the engine output could not be reconciled with the table,
//!   surfaced with the offending report fragment)
//!
//! Nothing is retried and no partial result is ever returned.

use std::path::PathBuf;
use std::time::Duration;

/// Result alias used across the pipeline
pub type Result<T> = std::result::Result<T, DecoranaError>;

/// Report section a parse error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    SiteScores,
    SpeciesScores,
    Done,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Header => "header",
            Section::SiteScores => "site scores",
            Section::SpeciesScores => "species scores",
            Section::Done => "end of report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecoranaError {
    /// Table or options violate an invariant the engine relies on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two labels on the same axis become identical once cut to the
    /// exchange format's fixed width.
    #[error("Labels '{first}' and '{second}' both truncate to '{truncated}' ({width}-character {axis} label field)")]
    LabelTooLong {
        axis: &'static str,
        first: String,
        second: String,
        truncated: String,
        width: usize,
    },

    /// Engine binary (or the compiler needed to build it) cannot be resolved.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Engine (or its build step) exited unsuccessfully.
    #[error("Engine exited with {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    EngineExecution {
        status: String,
        stdout: String,
        stderr: String,
    },

    /// Engine exceeded the configured wall-clock limit and was killed.
    #[error("Engine exceeded timeout of {limit:?} and was terminated")]
    EngineTimeout { limit: Duration },

    /// Caller cancelled the run; the engine was killed.
    #[error("Engine run cancelled after {elapsed:?}")]
    EngineCancelled { elapsed: Duration },

    /// Engine reported success but its report file is absent or empty.
    #[error("Engine reported success but {} is missing or empty", path.display())]
    EngineOutputMissing { path: PathBuf },

    /// A report line could not be read as expected.
    #[error("Malformed report in {section} (line {line_number}): {reason}\n  > {line}")]
    MalformedReport {
        section: Section,
        line_number: usize,
        line: String,
        reason: String,
    },

    /// Report ended before all sections/entries were seen.
    #[error("Incomplete report: {0}")]
    IncompleteReport(String),

    /// A label in the report matches no original label unambiguously.
    #[error("Report label '{token}' in {section} does not match {reason}")]
    UnmatchedLabel {
        section: Section,
        token: String,
        reason: String,
    },

    /// Requested biplot axis is not in the result.
    #[error("Axis {axis} out of range: result has {available} axes")]
    AxisOutOfRange { axis: usize, available: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Biplot rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DecoranaError {
    /// Caller must fix the data or options.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::LabelTooLong { .. } | Self::Config(_)
        )
    }

    /// Environment or engine process problem.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(_)
                | Self::EngineExecution { .. }
                | Self::EngineTimeout { .. }
                | Self::EngineCancelled { .. }
                | Self::EngineOutputMissing { .. }
        )
    }

    /// Engine output could not be reconciled with the input table.
    pub fn is_report_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedReport { .. } | Self::IncompleteReport(_) | Self::UnmatchedLabel { .. }
        )
    }
}
