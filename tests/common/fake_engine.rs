//! Stand-in for the DECORANA executable
//!
//! A small `sh` script written into its own temporary directory. By default
//! it checks that the exchange file was placed in its working directory,
//! copies the exchange and parameter files into a capture directory the test
//! can inspect afterwards, and writes a canned report.

use decorana_rs::{EngineConfig, ReportSource};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeEngine {
    dir: TempDir,
    script: PathBuf,
}

impl FakeEngine {
    /// Engine running an arbitrary script body
    pub fn with_script(body: &str) -> Self {
        let dir = TempDir::new().expect("create fake engine dir");
        let script = dir.path().join("decorana");
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).expect("write fake engine");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("mark fake engine executable");
        Self { dir, script }
    }

    /// Engine that answers every run with `report`
    pub fn reporting(report: &str) -> Self {
        Self::reporting_with_scores(report, None)
    }

    /// Engine that also writes a positional scores file
    pub fn reporting_with_scores(report: &str, scores: Option<&str>) -> Self {
        let mut body = String::from(
            "test -f cep.dat || { echo 'cep.dat missing' >&2; exit 3; }\n\
             cp cep.dat \"$(dirname \"$0\")/cep.seen\"\n\
             cat > \"$(dirname \"$0\")/params.seen\"\n",
        );
        body.push_str(&heredoc("decorana.prt", report));
        if let Some(scores) = scores {
            body.push_str(&heredoc("decorana.out", scores));
        }
        Self::with_script(&body)
    }

    pub fn path(&self) -> &Path {
        &self.script
    }

    /// Configuration reading scores from the canned printed report
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            report_source: ReportSource::PrintedReport,
            ..EngineConfig::binary(&self.script)
        }
    }

    /// Exchange file seen by the most recent run
    pub fn seen_exchange(&self) -> String {
        fs::read_to_string(self.dir.path().join("cep.seen")).expect("engine never saw cep.dat")
    }

    /// Parameter file read from stdin by the most recent run
    pub fn seen_params(&self) -> String {
        fs::read_to_string(self.dir.path().join("params.seen")).expect("engine never read stdin")
    }
}

fn heredoc(file: &str, contents: &str) -> String {
    format!("cat > {} <<'DECORANA_EOF'\n{}\nDECORANA_EOF\n", file, contents.trim_end())
}
