//! Abundance Table Loading and Validation
//!
//! Holds the samples × species matrix handed to the engine. Tables arrive
//! from polars DataFrames (one label column plus numeric species columns) or
//! from CSV files whose first column holds the site labels.

use crate::error::{DecoranaError, Result};
use polars::prelude::*;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Samples × species abundance matrix with its labels
///
/// Rows are sites (samples), columns are species. Values are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: Vec<f64>,
}

impl AbundanceTable {
    /// Build a table from labels and a row-major matrix
    ///
    /// Only the shape is checked here. Content rules (finite, non-negative,
    /// no empty rows/columns, unique labels) are enforced by `validate`, which
    /// the exchange writer calls before anything is written.
    ///
    /// # Errors
    /// `InvalidInput` if the matrix does not match the label counts.
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        matrix: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if matrix.len() != row_labels.len() {
            return Err(DecoranaError::InvalidInput(format!(
                "matrix has {} rows but {} row labels were given",
                matrix.len(),
                row_labels.len()
            )));
        }

        let n_cols = col_labels.len();
        let mut values = Vec::with_capacity(row_labels.len() * n_cols);
        for (label, row) in row_labels.iter().zip(&matrix) {
            if row.len() != n_cols {
                return Err(DecoranaError::InvalidInput(format!(
                    "row '{}' has {} values but there are {} column labels",
                    label,
                    row.len(),
                    n_cols
                )));
            }
            values.extend_from_slice(row);
        }

        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    /// Convert a DataFrame with one label column and numeric species columns
    ///
    /// Every column other than `label_column` becomes a species. Integer
    /// columns are cast to f64; null cells are rejected.
    ///
    /// # Example
    /// ```rust
    /// use decorana_rs::AbundanceTable;
    /// use polars::prelude::*;
    ///
    /// let df = df!(
    ///     "site" => ["S1", "S2"],
    ///     "Poa annua" => [3i64, 0],
    ///     "Bellis perennis" => [1i64, 4],
    /// ).unwrap();
    ///
    /// let table = AbundanceTable::from_dataframe(&df, "site").unwrap();
    /// assert_eq!(table.n_rows(), 2);
    /// assert_eq!(table.col_labels(), ["Poa annua", "Bellis perennis"]);
    /// ```
    pub fn from_dataframe(df: &DataFrame, label_column: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let labels = df
            .column(label_column)
            .with_context(|| format!("Label column '{}' not found", label_column))?
            .as_materialized_series()
            .cast(&DataType::String)
            .with_context(|| format!("Label column '{}' cannot be read as text", label_column))?;

        let row_labels: Vec<String> = labels
            .str()
            .with_context(|| format!("Label column '{}' is not string type", label_column))?
            .into_iter()
            .enumerate()
            .map(|(idx, label)| {
                label
                    .map(|s| s.to_string())
                    .ok_or_else(|| anyhow::anyhow!("Missing site label in row {}", idx + 1))
            })
            .collect::<anyhow::Result<_>>()?;

        let species_columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != label_column)
            .collect();

        let mut matrix = vec![Vec::with_capacity(species_columns.len()); df.height()];
        for name in &species_columns {
            let series = df
                .column(name)
                .with_context(|| format!("Column '{}' not found", name))?
                .as_materialized_series()
                .cast(&DataType::Float64)
                .with_context(|| format!("Column '{}' is not numeric", name))?;
            let chunked = series
                .f64()
                .with_context(|| format!("Column '{}' is not f64 after cast", name))?;

            for (idx, value) in chunked.into_iter().enumerate() {
                let value = value.ok_or_else(|| {
                    anyhow::anyhow!("Missing abundance for site '{}', species '{}'", row_labels[idx], name)
                })?;
                matrix[idx].push(value);
            }
        }

        Ok(Self::new(row_labels, species_columns, matrix)?)
    }

    /// Load a CSV file whose first column holds site labels
    pub fn from_csv(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.into()))
            .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to load abundance CSV: {}", path.display()))?;

        let label_column = df
            .get_column_names()
            .first()
            .map(|name| name.to_string())
            .ok_or_else(|| anyhow::anyhow!("CSV has no columns: {}", path.display()))?;

        tracing::info!(
            "Loaded {} ({} sites, {} species)",
            path.display(),
            df.height(),
            df.width().saturating_sub(1)
        );

        Self::from_dataframe(&df, &label_column)
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    /// Abundance of species `col` at site `row`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols() + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.n_cols();
        &self.values[row * n..(row + 1) * n]
    }

    /// Check every invariant the engine relies on
    ///
    /// # Errors
    /// `InvalidInput` naming the offending row/column when:
    /// - the table has no rows or no columns
    /// - a label is empty, non-ASCII, or duplicated on its axis
    /// - a value is negative, NaN or infinite
    /// - a row or a column holds only zeros
    pub fn validate(&self) -> Result<()> {
        if self.n_rows() == 0 || self.n_cols() == 0 {
            return Err(DecoranaError::InvalidInput(format!(
                "table must have at least one site and one species (got {} × {})",
                self.n_rows(),
                self.n_cols()
            )));
        }

        check_labels(&self.row_labels, "site")?;
        check_labels(&self.col_labels, "species")?;

        let mut col_totals = vec![0.0; self.n_cols()];
        for (r, label) in self.row_labels.iter().enumerate() {
            let mut row_total = 0.0;
            for (c, value) in self.row(r).iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(DecoranaError::InvalidInput(format!(
                        "abundance at site '{}', species '{}' must be finite and non-negative (got {})",
                        label, self.col_labels[c], value
                    )));
                }
                row_total += value;
                col_totals[c] += value;
            }
            if row_total == 0.0 {
                return Err(DecoranaError::InvalidInput(format!(
                    "site '{}' has no non-zero abundance",
                    label
                )));
            }
        }

        if let Some(c) = col_totals.iter().position(|total| *total == 0.0) {
            return Err(DecoranaError::InvalidInput(format!(
                "species '{}' has no non-zero abundance",
                self.col_labels[c]
            )));
        }

        Ok(())
    }
}

fn check_labels(labels: &[String], axis: &str) -> Result<()> {
    let mut seen = FxHashSet::default();
    for (idx, label) in labels.iter().enumerate() {
        if label.trim().is_empty() {
            return Err(DecoranaError::InvalidInput(format!(
                "{} label at position {} is empty",
                axis,
                idx + 1
            )));
        }
        // Fixed-width fields are counted in bytes by the engine
        if !label.is_ascii() {
            return Err(DecoranaError::InvalidInput(format!(
                "{} label '{}' contains non-ASCII characters",
                axis, label
            )));
        }
        if !seen.insert(label.as_str()) {
            return Err(DecoranaError::InvalidInput(format!(
                "{} label '{}' appears more than once",
                axis, label
            )));
        }
    }
    Ok(())
}
