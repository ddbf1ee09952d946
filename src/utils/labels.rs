//! Label handling for the Cornell condensed format
//!
//! Sample and species names occupy fixed 8-character fields (A8) in the
//! exchange file, and the engine echoes them back in the same width.
//! - `exchange_labels`: left-justified truncation with collision detection
//! - `cep_names`: botanical abbreviation (genus + epithet, four letters each)

use crate::error::{DecoranaError, Result};
use rustc_hash::FxHashMap;

/// Width of a label field in the exchange file
pub const LABEL_WIDTH: usize = 8;

/// Cut a label to the exchange field width.
///
/// Surrounding whitespace is dropped and interior runs of whitespace become
/// a single space, since the report is read back as space-separated tokens.
/// The result is never padded.
pub fn truncate_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(LABEL_WIDTH)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Truncate every label on one axis, rejecting collisions.
///
/// # Arguments
/// * `labels` - Original labels (already known to be unique and ASCII)
/// * `axis` - "site" or "species", used in the error
///
/// # Errors
/// `LabelTooLong` when two distinct labels share the same truncated form.
pub fn exchange_labels(labels: &[String], axis: &'static str) -> Result<Vec<String>> {
    let mut seen: FxHashMap<String, &str> = FxHashMap::default();
    let mut out = Vec::with_capacity(labels.len());

    for label in labels {
        let truncated = truncate_label(label);
        if let Some(first) = seen.get(&truncated) {
            return Err(DecoranaError::LabelTooLong {
                axis,
                first: first.to_string(),
                second: label.clone(),
                truncated,
                width: LABEL_WIDTH,
            });
        }
        seen.insert(truncated.clone(), label.as_str());
        out.push(truncated);
    }

    Ok(out)
}

/// Abbreviate Latin names into eight-character CEP names.
///
/// The name is built from the first four letters of the first word and the
/// first four letters of the last word (or of the second word when
/// `second_item` is set), with a trailing '.' dropped from the second part.
/// Single-word names are cut to eight letters. Duplicates are made unique by
/// keeping seven characters and appending a running counter shared by the
/// whole list.
///
/// # Example
/// ```rust
/// use decorana_rs::utils::cep_names;
///
/// let names = vec!["Quercus robur".to_string(), "Poa".to_string()];
/// assert_eq!(cep_names(&names, false), vec!["Querrobu", "Poa"]);
/// ```
pub fn cep_names(names: &[String], second_item: bool) -> Vec<String> {
    let mut counter = 1;
    let mut out: Vec<String> = Vec::with_capacity(names.len());

    for name in names {
        let words: Vec<&str> = name.split_whitespace().collect();
        let Some(&first) = words.first() else {
            out.push(String::new());
            continue;
        };

        let index = if second_item { 1 } else { words.len() - 1 };
        let second = words.get(index).copied().unwrap_or(first);

        let abbrev: String = if first != second {
            let head: String = first.chars().take(4).collect();
            let tail: String = second.chars().take(4).collect();
            format!("{}{}", head, tail.trim_end_matches('.'))
        } else {
            first.chars().take(LABEL_WIDTH).collect()
        };

        if out.contains(&abbrev) {
            let stem: String = abbrev.chars().take(LABEL_WIDTH - 1).collect();
            out.push(format!("{}{}", stem, counter));
            counter += 1;
        } else {
            out.push(abbrev);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("S1"), "S1");
        assert_eq!(truncate_label("  Plot 12  "), "Plot 12");
        assert_eq!(truncate_label("Achillea millefolium"), "Achillea");
        // Interior space at the cut point is not kept
        assert_eq!(truncate_label("Plot 123 4"), "Plot 123");
        assert_eq!(truncate_label("Plot    9"), "Plot 9");
    }

    #[test]
    fn test_truncate_label_collapses_whitespace_runs() {
        assert_eq!(truncate_label("Plot  1"), "Plot 1");
        assert_eq!(truncate_label("Plot\t2"), "Plot 2");
        assert_eq!(truncate_label("A   B   C   D"), "A B C D");
    }

    #[test]
    fn test_exchange_labels_whitespace_collision() {
        let labels = strings(&["Plot 1", "Plot  1"]);
        let err = exchange_labels(&labels, "site").unwrap_err();
        assert!(matches!(
            err,
            DecoranaError::LabelTooLong { ref truncated, .. } if truncated == "Plot 1"
        ));

        let labels = strings(&["Plot  1", "Plot  2"]);
        assert_eq!(exchange_labels(&labels, "site").unwrap(), strings(&["Plot 1", "Plot 2"]));
    }

    #[test]
    fn test_exchange_labels_short_labels_unchanged() {
        let labels = strings(&["Sp1", "Sp2", "Sp3"]);
        assert_eq!(exchange_labels(&labels, "species").unwrap(), labels);
    }

    #[test]
    fn test_exchange_labels_collision() {
        let labels = strings(&["Transect_A", "Transect_B"]);
        let err = exchange_labels(&labels, "site").unwrap_err();
        match err {
            DecoranaError::LabelTooLong { axis, first, second, truncated, width } => {
                assert_eq!(axis, "site");
                assert_eq!(first, "Transect_A");
                assert_eq!(second, "Transect_B");
                assert_eq!(truncated, "Transect");
                assert_eq!(width, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cep_names_genus_epithet() {
        let names = strings(&["Achillea millefolium", "Agrostis stolonifera", "Poa pratensis"]);
        assert_eq!(cep_names(&names, false), vec!["Achimill", "Agrostol", "Poaprat"]);
    }

    #[test]
    fn test_cep_names_last_vs_second_item() {
        let names = strings(&["Festuca rubra ssp. commutata"]);
        assert_eq!(cep_names(&names, false), vec!["Festcomm"]);
        assert_eq!(cep_names(&names, true), vec!["Festrubr"]);
    }

    #[test]
    fn test_cep_names_strips_trailing_dot() {
        let names = strings(&["Carex sp."]);
        assert_eq!(cep_names(&names, false), vec!["Caresp"]);
    }

    #[test]
    fn test_cep_names_duplicates_get_counter() {
        let names = strings(&["Salix albida", "Salix albicans", "Salix albiflora"]);
        assert_eq!(cep_names(&names, false), vec!["Salialbi", "Salialb1", "Salialb2"]);
    }

    #[test]
    fn test_cep_names_single_word() {
        let names = strings(&["Sphagnum", "Brachythecium"]);
        assert_eq!(cep_names(&names, false), vec!["Sphagnum", "Brachyth"]);
    }
}
