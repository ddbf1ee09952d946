//! Integration tests: writer + engine process + report parser
//!
//! The DECORANA executable is replaced by a shell script that checks its
//! inputs and answers with a canned report, so these tests exercise the real
//! process plumbing without the Fortran engine.
#![cfg(unix)]

use decorana_rs::{
    parameter_file, AbundanceTable, CancelFlag, Decorana, DecoranaError, EngineConfig,
    EngineSource, ExchangeFormatWriter, OrdinationOptions, ReportSource, Section,
};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

mod common;
use common::fixtures::{DUNE_EIGENVALUES, DUNE_SITES, DUNE_SPECIES};
use common::{
    dune_report, dune_scores, dune_table, init_tracing, render_report, strings, workspace_count,
    FakeEngine,
};

fn options() -> OrdinationOptions {
    OrdinationOptions {
        title: "dune".to_string(),
        ..OrdinationOptions::default()
    }
}

// =================================================================================================
// Successful runs
// =================================================================================================

#[test]
fn test_three_by_three_end_to_end() {
    init_tracing();
    let engine = FakeEngine::reporting(&dune_report());
    let work = TempDir::new().unwrap();
    let config = engine.config().with_work_root(work.path());

    let decorana = Decorana::new(config, options()).unwrap();
    let result = decorana.run(&dune_table()).unwrap();

    assert_eq!(result.eigenvalues(), &DUNE_EIGENVALUES);
    assert!(result.eigenvalues().windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(result.sites().labels(), strings(&["S1", "S2", "S3"]).as_slice());
    assert_eq!(result.species().labels(), strings(&["Sp1", "Sp2", "Sp3"]).as_slice());
    assert_eq!(result.sites().get("S1"), Some(&DUNE_SITES[0].1[..]));
    // Report lists Sp3 first; the result keeps table order
    assert_eq!(result.species().row(2), &DUNE_SPECIES[0].1[..]);
    assert_eq!(result.n_axes(), 4);

    // The engine saw exactly what the writer produces
    let expected = ExchangeFormatWriter::new(&options()).write(&dune_table()).unwrap();
    assert_eq!(engine.seen_exchange(), expected.as_str());
    assert_eq!(engine.seen_params(), parameter_file("cep.dat", &options()));

    assert_eq!(workspace_count(work.path()), 0, "workspace must be removed");
}

#[test]
fn test_long_labels_round_trip() {
    let table = AbundanceTable::new(
        strings(&["Plot north-east", "Plot south"]),
        strings(&["Achillea millefolium", "Agrostis stolonifera"]),
        vec![vec![2.0, 1.0], vec![0.0, 5.0]],
    )
    .unwrap();
    let report = render_report(
        &[0.4, 0.1, 0.05, 0.01],
        &[("Plot nor", [1.0, 0.5, 0.0, 0.0]), ("Plot sou", [-1.0, 0.2, 0.0, 0.0])],
        &[("Achillea", [1.5, 0.1, 0.0, 0.0]), ("Agrostis", [-0.5, 0.3, 0.0, 0.0])],
    );
    let engine = FakeEngine::reporting(&report);

    let result = Decorana::new(engine.config(), options()).unwrap().run(&table).unwrap();

    assert_eq!(result.sites().get("Plot north-east"), Some(&[1.0, 0.5, 0.0, 0.0][..]));
    assert_eq!(result.species().get("Agrostis stolonifera"), Some(&[-0.5, 0.3, 0.0, 0.0][..]));
    assert_eq!(result.species().get("Agrostis"), None);

    let exchange = engine.seen_exchange();
    assert!(exchange.contains("Achillea"));
    assert!(!exchange.contains("millefolium"));
}

#[test]
fn test_labels_with_whitespace_runs_round_trip() {
    let table = AbundanceTable::new(
        strings(&["Plot  1", "Plot  2"]),
        strings(&["Sp1", "Sp2"]),
        vec![vec![2.0, 1.0], vec![0.0, 5.0]],
    )
    .unwrap();
    // The engine echoes the single-spaced labels it was given
    let report = render_report(
        &[0.4, 0.1, 0.05, 0.01],
        &[("Plot 1", [1.0, 0.5, 0.0, 0.0]), ("Plot 2", [-1.0, 0.2, 0.0, 0.0])],
        &[("Sp1", [1.5, 0.1, 0.0, 0.0]), ("Sp2", [-0.5, 0.3, 0.0, 0.0])],
    );
    let engine = FakeEngine::reporting(&report);

    let result = Decorana::new(engine.config(), options()).unwrap().run(&table).unwrap();

    assert_eq!(result.sites().labels(), strings(&["Plot  1", "Plot  2"]).as_slice());
    assert_eq!(result.sites().get("Plot  1"), Some(&[1.0, 0.5, 0.0, 0.0][..]));
    assert_eq!(result.sites().get("Plot  2"), Some(&[-1.0, 0.2, 0.0, 0.0][..]));
    assert!(engine.seen_exchange().contains("Plot 1"));
    assert!(!engine.seen_exchange().contains("Plot  1"));
}

#[test]
fn test_whitespace_collision_rejected() {
    let engine = FakeEngine::reporting(&dune_report());
    let table = AbundanceTable::new(
        strings(&["Plot 1", "Plot  1"]),
        strings(&["Sp1", "Sp2"]),
        vec![vec![2.0, 1.0], vec![0.0, 5.0]],
    )
    .unwrap();

    let err = Decorana::new(engine.config(), options()).unwrap().run(&table).unwrap_err();
    assert!(matches!(err, DecoranaError::LabelTooLong { .. }));
}

#[test]
fn test_repeated_runs_are_identical() {
    let engine = FakeEngine::reporting(&dune_report());
    let decorana = Decorana::new(engine.config(), options()).unwrap();

    let first = decorana.run(&dune_table()).unwrap();
    let first_exchange = engine.seen_exchange();
    let second = decorana.run(&dune_table()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_exchange, engine.seen_exchange());
}

#[test]
fn test_fewer_axes_requested() {
    let engine = FakeEngine::reporting(&render_report(
        &DUNE_EIGENVALUES,
        &DUNE_SITES,
        &DUNE_SPECIES,
    ));
    let opts = OrdinationOptions { axes: 2, ..options() };

    let result = Decorana::new(engine.config(), opts).unwrap().run(&dune_table()).unwrap();

    assert_eq!(result.eigenvalues(), &DUNE_EIGENVALUES[..2]);
    assert_eq!(result.sites().get("S2"), Some(&[0.211, 1.320][..]));
    let params = engine.seen_params();
    let records: Vec<&str> = params.lines().map(str::trim).collect();
    assert_eq!(&records[8..10], ["1", "0"]);
    assert_eq!(records[10], "2");
}

#[test]
fn test_scores_file_mode() {
    let engine = FakeEngine::reporting_with_scores(&dune_report(), Some(&dune_scores()));
    let mut config = engine.config();
    config.report_source = ReportSource::ScoresFile;

    let result = Decorana::new(config, options()).unwrap().run(&dune_table()).unwrap();

    assert_eq!(result.eigenvalues(), &DUNE_EIGENVALUES);
    assert_eq!(result.sites().get("S2"), Some(&DUNE_SITES[1].1[..]));
    assert_eq!(result.species().get("Sp3"), Some(&DUNE_SPECIES[0].1[..]));
}

#[test]
fn test_default_engine_config_reads_scores_file() {
    // The printed report's score rows disagree with the scores file, so only
    // the positional file can produce the expected values
    let misleading = render_report(&DUNE_EIGENVALUES, &[("S1", [9.0; 4])], &[("Sp1", [9.0; 4])]);
    let engine = FakeEngine::reporting_with_scores(&misleading, Some(&dune_scores()));
    let config = EngineConfig {
        source: EngineSource::Binary {
            path: engine.path().to_path_buf(),
        },
        ..EngineConfig::default()
    };
    assert_eq!(config.report_source, ReportSource::ScoresFile);

    let result = Decorana::new(config, OrdinationOptions::default())
        .unwrap()
        .run(&dune_table())
        .unwrap();

    assert_eq!(result.eigenvalues(), &DUNE_EIGENVALUES);
    assert_eq!(result.sites().get("S1"), Some(&DUNE_SITES[0].1[..]));
    assert_eq!(result.species().get("Sp1"), Some(&DUNE_SPECIES[1].1[..]));
    assert_eq!(engine.seen_params(), parameter_file("cep.dat", &OrdinationOptions::default()));
}

#[test]
fn test_scores_file_mode_without_scores_file() {
    let engine = FakeEngine::reporting(&dune_report());
    let mut config = engine.config();
    config.report_source = ReportSource::ScoresFile;

    let err = Decorana::new(config, options()).unwrap().run(&dune_table()).unwrap_err();
    assert!(matches!(err, DecoranaError::EngineOutputMissing { .. }));
}

#[test]
fn test_engine_built_from_fortran_source() {
    // "Compiler" copies the source script into place as the engine
    let compiler = FakeEngine::with_script("cp \"$3\" \"$2\" && chmod 755 \"$2\"");
    let source = FakeEngine::reporting(&dune_report());
    let config = EngineConfig {
        report_source: ReportSource::PrintedReport,
        ..EngineConfig::fortran(source.path(), compiler.path().to_string_lossy())
    };

    let result = Decorana::new(config, options()).unwrap().run(&dune_table()).unwrap();
    assert_eq!(result.eigenvalues(), &DUNE_EIGENVALUES);
}

#[test]
fn test_csv_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dune.csv");
    std::fs::write(&path, "site,Sp1,Sp2,Sp3\nS1,10,0,2\nS2,0,5,3\nS3,4,6,0\n").unwrap();

    let table = AbundanceTable::from_csv(&path).unwrap();
    assert_eq!(table, dune_table());

    let engine = FakeEngine::reporting(&dune_report());
    let result = Decorana::new(engine.config(), options()).unwrap().run(&table).unwrap();
    assert_eq!(result.sites().len(), 3);
}

#[test]
fn test_one_shot_entry_point() {
    let engine = FakeEngine::reporting(&dune_report());
    let (sites, species, site_labels, species_labels) =
        decorana_rs::decorana(&dune_table(), engine.config(), options()).unwrap();

    assert_eq!(site_labels, strings(&["S1", "S2", "S3"]));
    assert_eq!(species_labels, strings(&["Sp1", "Sp2", "Sp3"]));
    assert_eq!(sites.len(), 3);
    assert_eq!(species.n_axes(), 4);
}

// =================================================================================================
// Input errors: nothing reaches the engine
// =================================================================================================

#[test]
fn test_all_zero_row_rejected_before_workspace() {
    let engine = FakeEngine::reporting(&dune_report());
    let work = TempDir::new().unwrap();
    let decorana = Decorana::new(engine.config().with_work_root(work.path()), options()).unwrap();

    let table = AbundanceTable::new(
        strings(&["S1", "S2"]),
        strings(&["Sp1", "Sp2"]),
        vec![vec![1.0, 2.0], vec![0.0, 0.0]],
    )
    .unwrap();

    let err = decorana.run(&table).unwrap_err();
    assert!(err.is_input_error());
    assert!(err.to_string().contains("'S2'"));
    assert_eq!(workspace_count(work.path()), 0);
}

#[test]
fn test_truncation_collision_rejected() {
    let engine = FakeEngine::reporting(&dune_report());
    let decorana = Decorana::new(engine.config(), options()).unwrap();

    let table = AbundanceTable::new(
        strings(&["S1", "S2"]),
        strings(&["Quercus robur", "Quercus rubra"]),
        vec![vec![1.0, 2.0], vec![3.0, 0.0]],
    )
    .unwrap();

    match decorana.run(&table).unwrap_err() {
        DecoranaError::LabelTooLong { first, second, truncated, .. } => {
            assert_eq!(first, "Quercus robur");
            assert_eq!(second, "Quercus rubra");
            assert_eq!(truncated, "Quercus");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_engine_fails_fast() {
    let err = Decorana::new(EngineConfig::binary("/nonexistent/decorana"), options())
        .err()
        .unwrap();
    assert!(matches!(err, DecoranaError::EngineUnavailable(_)));

    let fortran = EngineConfig::fortran("decorana.f", "no-such-fortran-compiler");
    let err = Decorana::new(fortran, options()).err().unwrap();
    assert!(err.to_string().contains("is not installed"));
}

#[test]
fn test_invalid_options_fail_fast() {
    let engine = FakeEngine::reporting(&dune_report());
    let opts = OrdinationOptions { axes: 5, ..options() };
    let err = Decorana::new(engine.config(), opts).err().unwrap();
    assert!(matches!(err, DecoranaError::Config(_)));
}

// =================================================================================================
// Engine failures: workspace always cleaned up
// =================================================================================================

#[test]
fn test_nonzero_exit_reports_stderr() {
    let engine = FakeEngine::with_script("echo 'fatal: singular matrix' >&2\nexit 2");
    let work = TempDir::new().unwrap();
    let decorana = Decorana::new(engine.config().with_work_root(work.path()), options()).unwrap();

    match decorana.run(&dune_table()).unwrap_err() {
        DecoranaError::EngineExecution { status, stderr, .. } => {
            assert!(status.contains('2'));
            assert!(stderr.contains("fatal: singular matrix"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(workspace_count(work.path()), 0);
}

#[test]
fn test_missing_report_file() {
    let engine = FakeEngine::with_script("cat > /dev/null\nexit 0");
    let err = Decorana::new(engine.config(), options())
        .unwrap()
        .run(&dune_table())
        .unwrap_err();
    match err {
        DecoranaError::EngineOutputMissing { path } => {
            assert!(path.ends_with("decorana.prt"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_timeout_kills_engine_and_cleans_up() {
    let engine = FakeEngine::with_script("exec sleep 5");
    let work = TempDir::new().unwrap();
    let config = engine
        .config()
        .with_timeout(Duration::from_millis(300))
        .with_work_root(work.path());

    let decorana = Decorana::new(config, options()).unwrap();
    let started = std::time::Instant::now();
    let err = decorana.run(&dune_table()).unwrap_err();

    assert!(matches!(err, DecoranaError::EngineTimeout { .. }));
    assert!(err.is_engine_error());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(workspace_count(work.path()), 0);
}

#[test]
fn test_hung_compiler_hits_run_timeout() {
    let compiler = FakeEngine::with_script("exec sleep 5");
    let source = FakeEngine::reporting(&dune_report());
    let work = TempDir::new().unwrap();
    let config = EngineConfig::fortran(source.path(), compiler.path().to_string_lossy())
        .with_timeout(Duration::from_millis(300))
        .with_work_root(work.path());

    let started = std::time::Instant::now();
    let err = Decorana::new(config, options()).unwrap().run(&dune_table()).unwrap_err();

    assert!(matches!(err, DecoranaError::EngineTimeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(workspace_count(work.path()), 0);
}

#[test]
fn test_cancel_from_another_thread() {
    let engine = FakeEngine::with_script("exec sleep 5");
    let work = TempDir::new().unwrap();
    let decorana = Decorana::new(engine.config().with_work_root(work.path()), options()).unwrap();

    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        trigger.cancel();
    });

    let err = decorana.run_with_cancel(&dune_table(), Some(&cancel)).unwrap_err();
    handle.join().unwrap();

    assert!(matches!(err, DecoranaError::EngineCancelled { .. }));
    assert_eq!(workspace_count(work.path()), 0);
}

// =================================================================================================
// Report errors surface with context
// =================================================================================================

#[test]
fn test_malformed_report_line() {
    // Drop the last score from S2's row
    let report = dune_report().replace("    -0.110\n", "\n");
    assert_ne!(report, dune_report(), "fixture line changed");
    let engine = FakeEngine::reporting(&report);

    let err = Decorana::new(engine.config(), options())
        .unwrap()
        .run(&dune_table())
        .unwrap_err();

    match err {
        DecoranaError::MalformedReport { section, line, .. } => {
            assert_eq!(section, Section::SiteScores);
            assert!(line.starts_with("S2"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_label_in_report() {
    let sites = [DUNE_SITES[0], DUNE_SITES[1], ("S9", [0.0; 4])];
    let engine = FakeEngine::reporting(&render_report(&DUNE_EIGENVALUES, &sites, &DUNE_SPECIES));

    let err = Decorana::new(engine.config(), options())
        .unwrap()
        .run(&dune_table())
        .unwrap_err();

    assert!(err.is_report_error());
    match err {
        DecoranaError::UnmatchedLabel { section, token, .. } => {
            assert_eq!(section, Section::SiteScores);
            assert_eq!(token, "S9");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_truncated_report_is_incomplete() {
    let report = dune_report();
    let cut = report.find("SPECIES SCORES").unwrap();
    let engine = FakeEngine::reporting(&report[..cut]);

    let err = Decorana::new(engine.config(), options())
        .unwrap()
        .run(&dune_table())
        .unwrap_err();
    assert!(matches!(err, DecoranaError::IncompleteReport(_)));
}

// =================================================================================================
// Batch runs
// =================================================================================================

#[test]
fn test_batch_runs_are_isolated() {
    let engine = FakeEngine::reporting(&dune_report());
    let work = TempDir::new().unwrap();
    let decorana = Decorana::new(engine.config().with_work_root(work.path()), options()).unwrap();

    let broken = AbundanceTable::new(
        strings(&["S1", "S2", "S3"]),
        strings(&["Sp1", "Sp2", "Sp3"]),
        vec![vec![10.0, 0.0, 2.0], vec![0.0, 5.0, 3.0], vec![f64::NAN, 6.0, 0.0]],
    )
    .unwrap();
    let tables = vec![dune_table(), broken, dune_table(), dune_table()];

    let results = decorana.run_batch(&tables);

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(DecoranaError::InvalidInput(_))));
    assert!(results[2].is_ok());
    assert_eq!(results[0].as_ref().unwrap(), results[3].as_ref().unwrap());
    assert_eq!(workspace_count(work.path()), 0);
}
