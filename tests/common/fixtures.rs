//! Tables and engine reports shared by the integration tests

use decorana_rs::AbundanceTable;
use std::fmt::Write as _;
use std::path::Path;

pub fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// 3 sites × 3 species, every row and column non-empty
pub fn dune_table() -> AbundanceTable {
    AbundanceTable::new(
        strings(&["S1", "S2", "S3"]),
        strings(&["Sp1", "Sp2", "Sp3"]),
        vec![
            vec![10.0, 0.0, 2.0],
            vec![0.0, 5.0, 3.0],
            vec![4.0, 6.0, 0.0],
        ],
    )
    .unwrap()
}

pub const DUNE_EIGENVALUES: [f64; 4] = [0.5231, 0.2144, 0.0912, 0.0410];

pub const DUNE_SITES: [(&str, [f64; 4]); 3] = [
    ("S1", [1.832, 0.104, -0.220, 0.018]),
    ("S2", [0.211, 1.320, 0.402, -0.110]),
    ("S3", [0.000, 0.000, 0.000, 0.000]),
];

pub const DUNE_SPECIES: [(&str, [f64; 4]); 3] = [
    ("Sp3", [2.104, 0.033, 0.117, -0.051]),
    ("Sp1", [-0.410, 1.200, 0.090, 0.002]),
    ("Sp2", [0.900, -0.700, 0.000, 0.310]),
];

pub fn dune_report() -> String {
    render_report(&DUNE_EIGENVALUES, &DUNE_SITES, &DUNE_SPECIES)
}

/// Positional scores file for the dune table: species rows in table order
pub fn dune_scores() -> String {
    let species_in_table_order = [DUNE_SPECIES[1], DUNE_SPECIES[2], DUNE_SPECIES[0]];
    let mut scores = String::new();
    for (site, sp) in DUNE_SITES.iter().zip(species_in_table_order.iter()) {
        let left: String = site.1.iter().map(|v| format!("{:10.4}", v)).collect();
        let right: String = sp.1.iter().map(|v| format!("{:10.4}", v)).collect();
        let _ = writeln!(scores, "{:<41}{}", left, right);
    }
    scores
}

/// Printed report in the layout the parser expects
pub fn render_report(
    eigenvalues: &[f64],
    sites: &[(&str, [f64; 4])],
    species: &[(&str, [f64; 4])],
) -> String {
    let mut out = String::from("DECORANA -- detrended correspondence analysis\n\n");

    out.push_str("EIGENVALUES ");
    for e in eigenvalues {
        let _ = write!(out, "{:>10.4}", e);
    }
    out.push_str("\n\nSAMPLE SCORES\nNAME            AX1       AX2       AX3       AX4\n");
    push_rows(&mut out, sites);
    out.push_str("\nSPECIES SCORES\n");
    push_rows(&mut out, species);
    out.push_str("\nLENGTHS OF GRADIENT   1.000   1.000   1.000   1.000\n");
    out
}

fn push_rows(out: &mut String, rows: &[(&str, [f64; 4])]) {
    for (label, c) in rows {
        let _ = writeln!(
            out,
            "{:<8}{:>10.3}{:>10.3}{:>10.3}{:>10.3}",
            label, c[0], c[1], c[2], c[3]
        );
    }
}

/// Number of workspace directories left under `root`
pub fn workspace_count(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("decorana-"))
            .count(),
        Err(_) => 0,
    }
}
