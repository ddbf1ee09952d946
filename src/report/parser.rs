//! Printed report parser
//!
//! The engine's report is free text. The parts we need are recognised by
//! marker lines:
//!
//! ```text
//! DECORANA ... (banner, iteration log, anything)
//! EIGENVALUES      0.5231    0.2144    0.0912    0.0410
//!
//! SAMPLE SCORES
//! NAME         AX1       AX2       AX3       AX4        <- optional heading
//! S1         1.832     0.104    -0.220     0.018
//! S2         0.211     1.320     0.402    -0.110
//!                                                       <- blank line ends the section
//! SPECIES SCORES
//! Sp1        2.104     0.033     0.117    -0.051
//! ...
//! ```
//!
//! A data line is a label followed by one number per extracted axis. The
//! label is everything before the trailing numbers, so labels may contain
//! spaces. Labels are matched back to the table exactly (original or
//! written form), then by unique prefix of the written form for labels the
//! engine shortened further.
//!
//! Marker recognition lives entirely in `MarkerRules`; a different engine
//! build only needs different rules.

use crate::error::{DecoranaError, Result, Section};
use crate::exchange::AxisLabels;
use crate::report::result::{Coordinates, OrdinationResult, ScoreTable};
use crate::utils::labels::truncate_label;
use rustc_hash::FxHashMap;

/// Marker line prefixes (matched case-insensitively on the trimmed line)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRules {
    pub eigenvalues: Vec<String>,
    pub site_scores: Vec<String>,
    pub species_scores: Vec<String>,
    /// Lines that close a score section without opening another
    pub section_end: Vec<String>,
}

impl Default for MarkerRules {
    fn default() -> Self {
        Self {
            eigenvalues: vec!["EIGENVALUES".to_string()],
            site_scores: vec!["SAMPLE SCORES".to_string(), "SITE SCORES".to_string()],
            species_scores: vec!["SPECIES SCORES".to_string()],
            section_end: vec!["LENGTHS OF GRADIENT".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Eigenvalues,
    Sites,
    Species,
    End,
}

impl MarkerRules {
    /// Recognise a marker line; returns the marker and the text after it
    fn classify<'l>(&self, line: &'l str) -> Option<(Marker, &'l str)> {
        let trimmed = line.trim_start();
        let upper = trimmed.to_ascii_uppercase();
        let groups = [
            (Marker::Eigenvalues, &self.eigenvalues),
            (Marker::Sites, &self.site_scores),
            (Marker::Species, &self.species_scores),
            (Marker::End, &self.section_end),
        ];
        for (marker, prefixes) in groups {
            for prefix in prefixes {
                if upper.starts_with(&prefix.to_ascii_uppercase()) {
                    // ASCII uppercasing keeps byte offsets
                    return Some((marker, &trimmed[prefix.len()..]));
                }
            }
        }
        None
    }
}

/// Rows collected for one side of the ordination
struct SectionRows<'a> {
    section: Section,
    labels: &'a AxisLabels,
    original_index: FxHashMap<&'a str, usize>,
    written_index: FxHashMap<&'a str, usize>,
    rows: Vec<Option<Coordinates>>,
    visited: bool,
    seen_in_section: usize,
}

impl<'a> SectionRows<'a> {
    fn new(section: Section, labels: &'a AxisLabels) -> Self {
        Self {
            section,
            labels,
            original_index: labels
                .original
                .iter()
                .enumerate()
                .map(|(i, l)| (l.as_str(), i))
                .collect(),
            written_index: labels
                .written
                .iter()
                .enumerate()
                .map(|(i, l)| (l.as_str(), i))
                .collect(),
            rows: vec![None; labels.len()],
            visited: false,
            seen_in_section: 0,
        }
    }

    /// Exact match on the original label, then on the written label
    fn exact(&self, token: &str) -> Option<usize> {
        self.original_index
            .get(token)
            .or_else(|| self.written_index.get(token))
            .copied()
    }

    /// Map a report label to its table position
    fn resolve(&self, token: &str) -> Result<usize> {
        if let Some(i) = self.exact(token) {
            return Ok(i);
        }

        let candidates: Vec<usize> = self
            .labels
            .written
            .iter()
            .enumerate()
            .filter(|(_, written)| written.starts_with(token))
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [only] => Ok(*only),
            [] => Err(DecoranaError::UnmatchedLabel {
                section: self.section,
                token: token.to_string(),
                reason: "any label of the input table".to_string(),
            }),
            many => Err(DecoranaError::UnmatchedLabel {
                section: self.section,
                token: token.to_string(),
                reason: format!(
                    "a single label (prefix of {})",
                    many.iter()
                        .map(|&i| format!("'{}'", self.labels.original[i]))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }

    fn missing(&self) -> Vec<&str> {
        self.rows
            .iter()
            .zip(&self.labels.original)
            .filter(|(row, _)| row.is_none())
            .map(|(_, label)| label.as_str())
            .collect()
    }

    fn into_table(self) -> Result<ScoreTable> {
        let coords = self.rows.into_iter().flatten().collect();
        ScoreTable::new(self.labels.original.clone(), coords)
    }
}

/// Parses the printed report of one run against the table that produced it
pub struct ReportParser<'a> {
    sites: &'a AxisLabels,
    species: &'a AxisLabels,
    axes: usize,
    rules: MarkerRules,
}

impl<'a> ReportParser<'a> {
    pub fn new(sites: &'a AxisLabels, species: &'a AxisLabels, axes: usize) -> Self {
        Self {
            sites,
            species,
            axes,
            rules: MarkerRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: MarkerRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parse the whole report; all sections must be present and complete
    ///
    /// # Errors
    /// - `MalformedReport`: a data line without a label and `axes` finite numbers,
    ///   a repeated section, or a label listed twice
    /// - `UnmatchedLabel`: a label no table label matches unambiguously
    /// - `IncompleteReport`: a section never appeared or entries are missing
    pub fn parse(&self, report: &str) -> Result<OrdinationResult> {
        let mut state = Section::Header;
        let mut eigenvalues: Option<Vec<f64>> = None;
        let mut sites = SectionRows::new(Section::SiteScores, self.sites);
        let mut species = SectionRows::new(Section::SpeciesScores, self.species);

        for (idx, raw) in report.lines().enumerate() {
            let line_number = idx + 1;
            let line = raw.trim_end();

            if let Some((marker, rest)) = self.rules.classify(line) {
                state = match marker {
                    Marker::Eigenvalues => {
                        if eigenvalues.is_some() {
                            return Err(malformed(state, line_number, line, "eigenvalues listed twice"));
                        }
                        eigenvalues = Some(self.eigenvalue_fields(rest, state, line_number, line)?);
                        Section::Header
                    }
                    Marker::Sites => open_section(&mut sites, line_number, line)?,
                    Marker::Species => open_section(&mut species, line_number, line)?,
                    Marker::End => Section::Header,
                };
                state = settle(state, &eigenvalues, &sites, &species);
                continue;
            }

            let current = match state {
                Section::SiteScores => &mut sites,
                Section::SpeciesScores => &mut species,
                Section::Header | Section::Done => continue,
            };

            if line.trim().is_empty() {
                if current.seen_in_section > 0 {
                    state = settle(Section::Header, &eigenvalues, &sites, &species);
                }
                continue;
            }

            self.data_line(current, line_number, line)?;
        }

        let mut missing_sections = Vec::new();
        if eigenvalues.is_none() {
            missing_sections.push("eigenvalues");
        }
        if !sites.visited {
            missing_sections.push("site scores");
        }
        if !species.visited {
            missing_sections.push("species scores");
        }
        if !missing_sections.is_empty() {
            return Err(DecoranaError::IncompleteReport(format!(
                "report ended without {}",
                missing_sections.join(", ")
            )));
        }

        for rows in [&sites, &species] {
            let missing = rows.missing();
            if !missing.is_empty() {
                return Err(DecoranaError::IncompleteReport(format!(
                    "{}: {} of {} entries found; missing {}",
                    rows.section,
                    rows.labels.len() - missing.len(),
                    rows.labels.len(),
                    missing.iter().map(|l| format!("'{}'", l)).collect::<Vec<_>>().join(", ")
                )));
            }
        }

        let result = OrdinationResult::new(
            eigenvalues.unwrap_or_default(),
            sites.into_table()?,
            species.into_table()?,
        );
        tracing::debug!(
            "Parsed report: {} eigenvalues, {} sites, {} species",
            result.eigenvalues().len(),
            result.sites().len(),
            result.species().len()
        );
        Ok(result)
    }

    /// Read only the eigenvalue line, if there is one
    pub fn eigenvalues(&self, report: &str) -> Result<Option<Vec<f64>>> {
        for (idx, raw) in report.lines().enumerate() {
            let line = raw.trim_end();
            if let Some((Marker::Eigenvalues, rest)) = self.rules.classify(line) {
                return self
                    .eigenvalue_fields(rest, Section::Header, idx + 1, line)
                    .map(Some);
            }
        }
        Ok(None)
    }

    fn eigenvalue_fields(
        &self,
        rest: &str,
        state: Section,
        line_number: usize,
        line: &str,
    ) -> Result<Vec<f64>> {
        let values = rest
            .split_whitespace()
            .map(parse_finite)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| malformed(state, line_number, line, "eigenvalues must be finite numbers"))?;

        if values.len() < self.axes {
            return Err(malformed(
                state,
                line_number,
                line,
                &format!("expected {} eigenvalues, found {}", self.axes, values.len()),
            ));
        }
        Ok(values[..self.axes].to_vec())
    }

    fn data_line(&self, rows: &mut SectionRows<'_>, line_number: usize, line: &str) -> Result<()> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        // Column heading before the first row
        if rows.seen_in_section == 0 && tokens.iter().all(|t| parse_finite(t).is_none()) {
            return Ok(());
        }

        // Scores are the numeric fields after the label. The engine may print
        // more axes than were requested; only the first `axes` are kept.
        let trailing = tokens
            .iter()
            .rev()
            .take_while(|t| parse_finite(t).is_some())
            .count();
        let first = (tokens.len() - trailing).max(1);
        if trailing < self.axes || tokens.len() < self.axes + first {
            return Err(malformed(
                rows.section,
                line_number,
                line,
                &format!("expected a label followed by {} finite numbers", self.axes),
            ));
        }
        let last = tokens.len() - self.axes;

        // A label may itself end in a number ("Plot 1"): an exact match on a
        // longer label wins before prefix matching on the shortest one.
        let label_at = |split: usize| tokens[..split].join(" ");
        let (split, position) = match (first..=last).find_map(|s| rows.exact(&label_at(s)).map(|i| (s, i))) {
            Some(found) => found,
            None => (first, rows.resolve(&label_at(first))?),
        };

        let coords: Coordinates = tokens[split..split + self.axes]
            .iter()
            .filter_map(|t| parse_finite(t))
            .collect();

        if rows.rows[position].is_some() {
            return Err(malformed(
                rows.section,
                line_number,
                line,
                &format!("'{}' listed more than once", rows.labels.original[position]),
            ));
        }

        rows.rows[position] = Some(coords);
        rows.seen_in_section += 1;
        Ok(())
    }
}

/// Parse a report against plain row/column labels
///
/// Written labels are derived with the writer's truncation rule.
pub fn parse_report(
    report: &str,
    row_labels: &[String],
    col_labels: &[String],
    axes: usize,
) -> Result<OrdinationResult> {
    let sites = axis_labels(row_labels);
    let species = axis_labels(col_labels);
    ReportParser::new(&sites, &species, axes).parse(report)
}

fn axis_labels(labels: &[String]) -> AxisLabels {
    AxisLabels {
        original: labels.to_vec(),
        written: labels.iter().map(|l| truncate_label(l)).collect(),
    }
}

fn open_section(rows: &mut SectionRows<'_>, line_number: usize, line: &str) -> Result<Section> {
    if rows.visited {
        return Err(malformed(rows.section, line_number, line, "section appears twice"));
    }
    rows.visited = true;
    Ok(rows.section)
}

/// Leaving a data section: Done once everything has been seen
fn settle(
    state: Section,
    eigenvalues: &Option<Vec<f64>>,
    sites: &SectionRows<'_>,
    species: &SectionRows<'_>,
) -> Section {
    match state {
        Section::Header if eigenvalues.is_some() && sites.visited && species.visited => Section::Done,
        other => other,
    }
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn malformed(section: Section, line_number: usize, line: &str, reason: &str) -> DecoranaError {
    DecoranaError::MalformedReport {
        section,
        line_number,
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
