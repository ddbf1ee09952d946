//! Shared helpers
//!
//! - Labels: fixed-width truncation and CEP name abbreviation
//! - Workspace: scoped per-invocation temporary directory

pub mod labels;
pub mod workspace;

pub use labels::{cep_names, exchange_labels, truncate_label, LABEL_WIDTH};
pub use workspace::Workspace;
