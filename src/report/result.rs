//! Ordination result types
//!
//! Scores are kept in the original table order; lookups by label go through
//! a small index built once per table.

use crate::error::{DecoranaError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Per-axis coordinates of one site or species (inline up to four axes)
pub type Coordinates = SmallVec<[f64; 4]>;

/// Labelled scores for one side of the ordination (sites or species)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    labels: Vec<String>,
    coords: Vec<Coordinates>,
    index: FxHashMap<String, usize>,
}

impl ScoreTable {
    /// Pair labels with their coordinates
    ///
    /// # Errors
    /// `InvalidInput` if counts differ, labels repeat, or rows have
    /// different axis counts.
    pub fn new(labels: Vec<String>, coords: Vec<Coordinates>) -> Result<Self> {
        if labels.len() != coords.len() {
            return Err(DecoranaError::InvalidInput(format!(
                "{} labels but {} score rows",
                labels.len(),
                coords.len()
            )));
        }
        if let Some(first) = coords.first() {
            if let Some(bad) = coords.iter().position(|c| c.len() != first.len()) {
                return Err(DecoranaError::InvalidInput(format!(
                    "score row '{}' has {} axes, expected {}",
                    labels[bad],
                    coords[bad].len(),
                    first.len()
                )));
            }
        }

        let mut index = FxHashMap::default();
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(DecoranaError::InvalidInput(format!(
                    "score label '{}' appears more than once",
                    label
                )));
            }
        }

        Ok(Self {
            labels,
            coords,
            index,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_axes(&self) -> usize {
        self.coords.first().map_or(0, |c| c.len())
    }

    /// Coordinates of the entry with this label
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.index.get(label).map(|&i| self.coords[i].as_slice())
    }

    /// Coordinates of the i-th entry (table order)
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i]
    }

    /// All values on one axis, in table order
    pub fn axis(&self, axis: usize) -> Option<Vec<f64>> {
        (axis < self.n_axes()).then(|| self.coords.iter().map(|c| c[axis]).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .zip(&self.coords)
            .map(|(l, c)| (l.as_str(), c.as_slice()))
    }
}

/// Complete output of one ordination run
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinationResult {
    eigenvalues: Vec<f64>,
    sites: ScoreTable,
    species: ScoreTable,
}

impl OrdinationResult {
    pub fn new(eigenvalues: Vec<f64>, sites: ScoreTable, species: ScoreTable) -> Self {
        Self {
            eigenvalues,
            sites,
            species,
        }
    }

    /// Eigenvalues in engine order (empty when read from a scores file alone)
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    pub fn sites(&self) -> &ScoreTable {
        &self.sites
    }

    pub fn species(&self) -> &ScoreTable {
        &self.species
    }

    pub fn n_axes(&self) -> usize {
        self.sites.n_axes().max(self.species.n_axes())
    }

    /// Split into (site scores, species scores, site labels, species labels)
    pub fn into_parts(self) -> (ScoreTable, ScoreTable, Vec<String>, Vec<String>) {
        let site_labels = self.sites.labels.clone();
        let species_labels = self.species.labels.clone();
        (self.sites, self.species, site_labels, species_labels)
    }
}
