//! Decorana - Main coordinator for ordination runs
//!
//! Ties the stages together for one table:
//! validate → serialize → workspace → engine → parse → cleanup.
//! Batch runs fan out over Rayon; every run gets its own workspace.

use crate::config::{EngineConfig, OrdinationOptions, ReportSource};
use crate::data::AbundanceTable;
use crate::engine::{CancelFlag, EngineInvoker, EngineOutput};
use crate::error::{DecoranaError, Result};
use crate::exchange::{ExchangeDocument, ExchangeFormatWriter};
use crate::report::{parse_scores_file, OrdinationResult, ReportParser, ScoreTable};
use crate::utils::Workspace;
use rayon::prelude::*;
use std::time::Instant;

/// Main ordination runner
///
/// Holds a resolved engine and the analysis options; stateless between runs,
/// so one instance can serve many tables (and threads).
pub struct Decorana {
    invoker: EngineInvoker,
    options: OrdinationOptions,
}

impl Decorana {
    /// Validate options and resolve the engine
    ///
    /// # Errors
    /// `Config` for bad options or file names, `EngineUnavailable` when the
    /// engine cannot be found. Both are raised before any table is touched.
    pub fn new(engine: EngineConfig, options: OrdinationOptions) -> Result<Self> {
        options.validate()?;
        let invoker = EngineInvoker::new(engine)?;

        tracing::info!(
            "Decorana ready: {:?} analysis, {} axes, report from {:?}",
            options.analysis,
            options.axes,
            invoker.config().report_source
        );

        Ok(Self { invoker, options })
    }

    pub fn options(&self) -> &OrdinationOptions {
        &self.options
    }

    pub fn engine_config(&self) -> &EngineConfig {
        self.invoker.config()
    }

    /// Run one ordination
    pub fn run(&self, table: &AbundanceTable) -> Result<OrdinationResult> {
        self.run_with_cancel(table, None)
    }

    /// Run one ordination that another thread may cancel
    ///
    /// The workspace is removed on every path out of this function.
    pub fn run_with_cancel(
        &self,
        table: &AbundanceTable,
        cancel: Option<&CancelFlag>,
    ) -> Result<OrdinationResult> {
        let started = Instant::now();

        // Serialize first: invalid tables never create a workspace
        let document = ExchangeFormatWriter::new(&self.options).write(table)?;

        let config = self.invoker.config();
        let workspace = Workspace::create(config.work_root.as_deref())?;
        tracing::debug!("Workspace {}", workspace.path().display());

        let output = self.invoker.run(&workspace, &document, &self.options, cancel)?;
        let result = self.interpret(&document, &output)?;

        if let Err(e) = workspace.close() {
            tracing::warn!("Failed to remove workspace: {}", e);
        }

        tracing::info!(
            "Ordination of {} sites x {} species done in {:?} (engine {:?})",
            table.n_rows(),
            table.n_cols(),
            started.elapsed(),
            output.elapsed
        );
        Ok(result)
    }

    /// Run several tables in parallel
    ///
    /// Results come back in input order. One failing table does not affect
    /// the others.
    pub fn run_batch(&self, tables: &[AbundanceTable]) -> Vec<Result<OrdinationResult>> {
        tracing::info!("Running batch of {} tables", tables.len());
        tables.par_iter().map(|table| self.run(table)).collect()
    }

    fn interpret(&self, document: &ExchangeDocument, output: &EngineOutput) -> Result<OrdinationResult> {
        let parser = ReportParser::new(&document.sites, &document.species, self.options.axes);
        match self.invoker.config().report_source {
            ReportSource::PrintedReport => parser.parse(&output.report),
            ReportSource::ScoresFile => {
                let scores = output.scores.as_deref().ok_or_else(|| DecoranaError::EngineOutputMissing {
                    path: self.invoker.config().scores_file.clone().into(),
                })?;
                let eigenvalues = parser.eigenvalues(&output.report)?.unwrap_or_default();
                parse_scores_file(
                    scores,
                    &document.sites,
                    &document.species,
                    self.options.axes,
                    eigenvalues,
                )
            }
        }
    }
}

/// One-shot entry point
///
/// Returns (site scores, species scores, site labels, species labels).
///
/// # Example
/// ```rust,ignore
/// let table = AbundanceTable::from_csv(Path::new("dune.csv"))?;
/// let (sites, species, site_labels, species_labels) =
///     decorana(&table, EngineConfig::default(), OrdinationOptions::default())?;
/// ```
pub fn decorana(
    table: &AbundanceTable,
    engine: EngineConfig,
    options: OrdinationOptions,
) -> Result<(ScoreTable, ScoreTable, Vec<String>, Vec<String>)> {
    Ok(Decorana::new(engine, options)?.run(table)?.into_parts())
}
