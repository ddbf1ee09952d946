//! External engine process
//!
//! One run = exchange file + parameter file written into the workspace, the
//! engine started with the workspace as working directory and the parameter
//! file on stdin, then polled until it exits, times out, or is cancelled.
//! stdout/stderr go to files in the workspace so a chatty engine can never
//! block on a full pipe.

use crate::config::{EngineConfig, OrdinationOptions};
use crate::engine::locator::ResolvedEngine;
use crate::error::{DecoranaError, Result};
use crate::exchange::{parameter_file, ExchangeDocument};
use crate::utils::workspace::Workspace;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PARAMETER_FILE: &str = "params.dat";
const STDOUT_FILE: &str = "engine.stdout";
const STDERR_FILE: &str = "engine.stderr";

/// How often a running engine is checked for exit, timeout and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shared flag for cancelling a run from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Text produced by one successful engine run
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Printed report (labelled sections)
    pub report: String,
    /// Positional scores file, when the engine wrote one
    pub scores: Option<String>,
    pub elapsed: Duration,
}

pub struct EngineInvoker {
    engine: ResolvedEngine,
    config: EngineConfig,
}

impl EngineInvoker {
    /// Resolve the engine; fails fast when it is unavailable
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let engine = ResolvedEngine::resolve(&config.source)?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the engine on one document inside `workspace`
    ///
    /// # Errors
    /// - `EngineExecution`: non-zero exit (captured stdout/stderr attached)
    /// - `EngineTimeout`: wall-clock limit exceeded; process killed
    /// - `EngineCancelled`: `cancel` was raised; process killed
    /// - `EngineOutputMissing`: success reported but the report is absent or empty
    pub fn run(
        &self,
        workspace: &Workspace,
        document: &ExchangeDocument,
        options: &OrdinationOptions,
        cancel: Option<&CancelFlag>,
    ) -> Result<EngineOutput> {
        document.save(workspace, &self.config.exchange_file)?;
        let params_path = workspace.write(
            PARAMETER_FILE,
            &parameter_file(&self.config.exchange_file, options),
        )?;

        let started = Instant::now();
        let limit = self.config.timeout();
        let executable = self.engine.executable(workspace, started, limit, cancel)?;

        let mut child = Command::new(&executable)
            .current_dir(workspace.path())
            .stdin(Stdio::from(File::open(&params_path)?))
            .stdout(Stdio::from(File::create(workspace.file(STDOUT_FILE))?))
            .stderr(Stdio::from(File::create(workspace.file(STDERR_FILE))?))
            .spawn()?;

        tracing::info!(
            "Started engine {} (pid {}) in {}",
            executable.display(),
            child.id(),
            workspace.path().display()
        );

        let status = supervise(&mut child, started, limit, cancel)?;
        let elapsed = started.elapsed();

        if !status.success() {
            tracing::warn!("Engine exited with {} after {:?}", status, elapsed);
            return Err(DecoranaError::EngineExecution {
                status: status.to_string(),
                stdout: read_lossy(&workspace.file(STDOUT_FILE)),
                stderr: read_lossy(&workspace.file(STDERR_FILE)),
            });
        }
        tracing::info!("Engine finished in {:?}", elapsed);

        let report_path = workspace.file(&self.config.report_file);
        let report = match fs::read(&report_path) {
            Ok(bytes) if !String::from_utf8_lossy(&bytes).trim().is_empty() => {
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => {
                return Err(DecoranaError::EngineOutputMissing { path: report_path });
            }
        };

        let scores_path = workspace.file(&self.config.scores_file);
        let scores = fs::read(&scores_path)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        Ok(EngineOutput {
            report,
            scores,
            elapsed,
        })
    }
}

/// Poll a child until it exits, killing it on timeout or cancellation
///
/// `limit` is measured from `started`, so the compile step and the engine run
/// share one wall-clock budget.
pub(crate) fn supervise(
    child: &mut Child,
    started: Instant,
    limit: Option<Duration>,
    cancel: Option<&CancelFlag>,
) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        if let Some(limit) = limit {
            if started.elapsed() >= limit {
                tracing::warn!("Exceeded {:?}; killing pid {}", limit, child.id());
                terminate(child);
                return Err(DecoranaError::EngineTimeout { limit });
            }
        }

        if cancel.is_some_and(CancelFlag::is_cancelled) {
            tracing::warn!("Run cancelled; killing pid {}", child.id());
            terminate(child);
            return Err(DecoranaError::EngineCancelled {
                elapsed: started.elapsed(),
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill and reap so no zombie holds workspace files open
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub(crate) fn read_lossy(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
