//! Cornell condensed exchange file writer
//!
//! Layout written for a table with `n` sites and `m` species:
//!
//! ```text
//! <title> (n samples x m species)
//! (I3,5(I3,F3.0))              Fortran format of a data record
//!   5                          couplets per record
//!   1  1 10  3  2              sample number, then (species, abundance) couplets
//!   2  2  5  3  3
//!   3  1  4  2  6
//!   0                          terminator (sample number 0)
//! Sp1     Sp2     Sp3          species names, 10 per line, A8
//! S1      S2      S3           sample names, 10 per line, A8
//! ```
//!
//! Zero cells are omitted. A sample with more than five non-zero species
//! continues on further records that repeat its sample number. Field widths
//! grow with the table: the index field fits the larger of `n` and `m`, the
//! value field fits the largest formatted abundance plus one blank.

use crate::config::{LabelPolicy, OrdinationOptions};
use crate::data::AbundanceTable;
use crate::error::{DecoranaError, Result};
use crate::utils::labels::{cep_names, exchange_labels, LABEL_WIDTH};
use crate::utils::workspace::Workspace;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Couplets per data record
pub const COUPLETS_PER_LINE: usize = 5;

/// Labels per line in the name blocks
pub const LABELS_PER_LINE: usize = 10;

/// Longest title the engine reads
const TITLE_WIDTH: usize = 80;

/// Narrowest integer/value field (the classic I3/F3.0 layout)
const MIN_FIELD_WIDTH: usize = 3;

/// Field widths of one exchange document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub index_width: usize,
    pub value_width: usize,
    pub decimals: usize,
}

impl FieldLayout {
    /// Fortran format line, e.g. `(I3,5(I3,F3.0))`
    pub fn format_line(&self) -> String {
        format!(
            "(I{iw},{k}(I{iw},F{vw}.{d}))",
            iw = self.index_width,
            k = COUPLETS_PER_LINE,
            vw = self.value_width,
            d = self.decimals
        )
    }
}

/// Labels of one axis as given by the caller and as written to the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisLabels {
    pub original: Vec<String>,
    pub written: Vec<String>,
}

impl AxisLabels {
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Serialized exchange file plus what is needed to read the engine's answer
#[derive(Debug, Clone)]
pub struct ExchangeDocument {
    text: String,
    layout: FieldLayout,
    pub sites: AxisLabels,
    pub species: AxisLabels,
}

impl ExchangeDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// Write the document into a workspace under `name`
    pub fn save(&self, workspace: &Workspace, name: &str) -> Result<PathBuf> {
        let path = workspace.write(name, &self.text)?;
        tracing::debug!("Wrote exchange file {} ({} bytes)", path.display(), self.text.len());
        Ok(path)
    }
}

/// Serializes abundance tables into the Cornell condensed format
pub struct ExchangeFormatWriter<'a> {
    options: &'a OrdinationOptions,
}

impl<'a> ExchangeFormatWriter<'a> {
    pub fn new(options: &'a OrdinationOptions) -> Self {
        Self { options }
    }

    /// Validate the table and serialize it
    ///
    /// # Errors
    /// - `InvalidInput` for table invariant violations, or an abundance that
    ///   rounds to zero at the configured precision
    /// - `LabelTooLong` when truncated labels collide on one axis
    pub fn write(&self, table: &AbundanceTable) -> Result<ExchangeDocument> {
        table.validate()?;

        let site_labels = table.row_labels().to_vec();
        let species_source = match self.options.label_policy {
            LabelPolicy::Truncate => table.col_labels().to_vec(),
            LabelPolicy::CepAbbreviate => cep_names(table.col_labels(), false),
        };

        let sites = AxisLabels {
            written: exchange_labels(&site_labels, "site")?,
            original: site_labels,
        };
        let species = AxisLabels {
            written: exchange_labels(&species_source, "species")?,
            original: table.col_labels().to_vec(),
        };

        let layout = self.layout_for(table)?;
        let mut text = String::new();

        // Header: title, record format, couplets per record
        let title = format!(
            "{} ({} samples x {} species)",
            self.options.title.trim(),
            table.n_rows(),
            table.n_cols()
        );
        text.push_str(&title.chars().take(TITLE_WIDTH).collect::<String>());
        text.push('\n');
        text.push_str(&layout.format_line());
        text.push('\n');
        let _ = writeln!(text, "{:>w$} ", COUPLETS_PER_LINE, w = layout.index_width);

        // Data block
        for r in 0..table.n_rows() {
            let couplets: Vec<(usize, f64)> = table
                .row(r)
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(c, v)| (c + 1, *v))
                .collect();

            for chunk in couplets.chunks(COUPLETS_PER_LINE) {
                let _ = write!(text, "{:>w$}", r + 1, w = layout.index_width);
                for (species_no, value) in chunk {
                    let _ = write!(
                        text,
                        "{:>iw$}{:>vw$.d$}",
                        species_no,
                        value,
                        iw = layout.index_width,
                        vw = layout.value_width,
                        d = layout.decimals
                    );
                }
                text.push('\n');
            }
        }
        let _ = writeln!(text, "{:>w$} ", 0, w = layout.index_width);

        // Name blocks
        write_label_block(&mut text, &species.written);
        write_label_block(&mut text, &sites.written);

        tracing::debug!(
            "Serialized {} × {} table with layout {}",
            table.n_rows(),
            table.n_cols(),
            layout.format_line()
        );

        Ok(ExchangeDocument {
            text,
            layout,
            sites,
            species,
        })
    }

    /// Choose the narrowest fields that hold every index and value
    fn layout_for(&self, table: &AbundanceTable) -> Result<FieldLayout> {
        let largest_index = table.n_rows().max(table.n_cols());
        let index_width = (largest_index.to_string().len() + 1).max(MIN_FIELD_WIDTH);

        let integral = (0..table.n_rows())
            .flat_map(|r| table.row(r).iter())
            .all(|v| v.fract() == 0.0);
        let decimals = if integral { 0 } else { self.options.decimals };

        let mut widest = 0;
        for r in 0..table.n_rows() {
            for (c, value) in table.row(r).iter().enumerate() {
                if *value == 0.0 {
                    continue;
                }
                let formatted = format!("{:.*}", decimals, value);
                if formatted.parse::<f64>().map_or(true, |v| v == 0.0) {
                    return Err(DecoranaError::InvalidInput(format!(
                        "abundance {} at site '{}', species '{}' rounds to zero with {} decimals",
                        value,
                        table.row_labels()[r],
                        table.col_labels()[c],
                        decimals
                    )));
                }
                widest = widest.max(formatted.len());
            }
        }

        Ok(FieldLayout {
            index_width,
            value_width: (widest + 1).max(MIN_FIELD_WIDTH),
            decimals,
        })
    }
}

fn write_label_block(text: &mut String, labels: &[String]) {
    for line in labels.chunks(LABELS_PER_LINE) {
        for label in line {
            let _ = write!(text, "{:<w$}", label, w = LABEL_WIDTH);
        }
        text.push('\n');
    }
}
