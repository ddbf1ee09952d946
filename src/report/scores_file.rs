//! Positional scores file parser
//!
//! Besides the printed report the engine writes a bare scores file: site
//! scores in the left block (columns 1-41) of the first `n_sites` lines and
//! species scores from column 42 onward on the first `n_species` lines. It
//! carries no labels, so rows are matched to the table by position.

use crate::error::{DecoranaError, Result, Section};
use crate::exchange::AxisLabels;
use crate::report::result::{Coordinates, OrdinationResult, ScoreTable};

/// Byte offset where the species block starts
pub const SPECIES_COLUMN: usize = 41;

/// Read a scores file against the labels of the table that produced it
///
/// `eigenvalues` are not in this file; pass the ones read from the printed
/// report (or an empty vector).
///
/// # Errors
/// - `IncompleteReport` when the file has fewer lines than sites or species
/// - `MalformedReport` when a block holds fewer than `axes` finite numbers
pub fn parse_scores_file(
    text: &str,
    sites: &AxisLabels,
    species: &AxisLabels,
    axes: usize,
    eigenvalues: Vec<f64>,
) -> Result<OrdinationResult> {
    let lines: Vec<&str> = text.lines().collect();
    let needed = sites.len().max(species.len());
    if lines.len() < needed {
        return Err(DecoranaError::IncompleteReport(format!(
            "scores file has {} lines, expected at least {} ({} sites, {} species)",
            lines.len(),
            needed,
            sites.len(),
            species.len()
        )));
    }

    let mut site_rows = Vec::with_capacity(sites.len());
    let mut species_rows = Vec::with_capacity(species.len());

    for (idx, line) in lines.iter().enumerate().take(needed) {
        let (left, right) = split_blocks(line);
        if idx < sites.len() {
            site_rows.push(leading_numbers(left, axes, Section::SiteScores, idx + 1, line)?);
        }
        if idx < species.len() {
            species_rows.push(leading_numbers(right, axes, Section::SpeciesScores, idx + 1, line)?);
        }
    }

    Ok(OrdinationResult::new(
        eigenvalues,
        ScoreTable::new(sites.original.clone(), site_rows)?,
        ScoreTable::new(species.original.clone(), species_rows)?,
    ))
}

fn split_blocks(line: &str) -> (&str, &str) {
    if line.len() <= SPECIES_COLUMN {
        return (line, "");
    }
    match line.get(..SPECIES_COLUMN) {
        Some(left) => (left, &line[SPECIES_COLUMN..]),
        None => (line, ""),
    }
}

fn leading_numbers(
    block: &str,
    axes: usize,
    section: Section,
    line_number: usize,
    line: &str,
) -> Result<Coordinates> {
    let values: Option<Coordinates> = block
        .split_whitespace()
        .take(axes)
        .map(|t| t.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();

    match values {
        Some(v) if v.len() == axes => Ok(v),
        _ => Err(DecoranaError::MalformedReport {
            section,
            line_number,
            line: line.to_string(),
            reason: format!("expected {} finite numbers in this block", axes),
        }),
    }
}
