//! Engine resolution
//!
//! Turns an `EngineSource` into something runnable before any workspace
//! exists, so a missing engine or compiler fails without leaving files behind.
//! Fortran sources are compiled later, inside the invocation's workspace.

use crate::config::EngineSource;
use crate::engine::invoker::{read_lossy, supervise, CancelFlag};
use crate::error::{DecoranaError, Result};
use crate::utils::workspace::Workspace;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Name of the executable compiled from Fortran source
const BUILT_ENGINE_NAME: &str = "decorana.exe";
const COMPILER_STDOUT: &str = "compiler.stdout";
const COMPILER_STDERR: &str = "compiler.stderr";

/// An engine whose availability has been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEngine {
    Executable(PathBuf),
    Fortran { compiler: PathBuf, source: PathBuf },
}

impl ResolvedEngine {
    /// Check that the engine (or its compiler and source) exists
    ///
    /// # Errors
    /// `EngineUnavailable` naming what could not be found.
    pub fn resolve(source: &EngineSource) -> Result<Self> {
        let resolved = match source {
            EngineSource::Binary { path } => {
                if !is_executable(path) {
                    return Err(DecoranaError::EngineUnavailable(format!(
                        "engine executable not found: {}",
                        path.display()
                    )));
                }
                ResolvedEngine::Executable(absolute(path)?)
            }
            EngineSource::Search { name } => {
                let path = find_program(name).ok_or_else(|| {
                    DecoranaError::EngineUnavailable(format!(
                        "engine '{}' not found on PATH",
                        name
                    ))
                })?;
                ResolvedEngine::Executable(path)
            }
            EngineSource::Fortran { source, compiler } => {
                let compiler_path = find_program(compiler).ok_or_else(|| {
                    DecoranaError::EngineUnavailable(format!(
                        "Fortran compiler '{}' is not installed",
                        compiler
                    ))
                })?;
                if !source.is_file() {
                    return Err(DecoranaError::EngineUnavailable(format!(
                        "engine source not found: {}",
                        source.display()
                    )));
                }
                ResolvedEngine::Fortran {
                    compiler: compiler_path,
                    source: absolute(source)?,
                }
            }
        };

        tracing::debug!("Resolved engine: {:?}", resolved);
        Ok(resolved)
    }

    /// Produce the executable for one run
    ///
    /// Prebuilt engines are returned as-is; Fortran sources are compiled
    /// into the workspace under the same timeout and cancellation as the
    /// engine run.
    ///
    /// # Errors
    /// - `EngineExecution` with the compiler output if compilation fails
    /// - `EngineTimeout` / `EngineCancelled` if the compiler is stopped
    pub fn executable(
        &self,
        workspace: &Workspace,
        started: Instant,
        limit: Option<Duration>,
        cancel: Option<&CancelFlag>,
    ) -> Result<PathBuf> {
        match self {
            ResolvedEngine::Executable(path) => Ok(path.clone()),
            ResolvedEngine::Fortran { compiler, source } => {
                let target = workspace.file(BUILT_ENGINE_NAME);
                tracing::info!("Compiling engine {} with {}", source.display(), compiler.display());

                let mut child = Command::new(compiler)
                    .arg("-o")
                    .arg(&target)
                    .arg(source)
                    .current_dir(workspace.path())
                    .stdin(Stdio::null())
                    .stdout(Stdio::from(File::create(workspace.file(COMPILER_STDOUT))?))
                    .stderr(Stdio::from(File::create(workspace.file(COMPILER_STDERR))?))
                    .spawn()?;

                let status = supervise(&mut child, started, limit, cancel)?;
                if !status.success() {
                    return Err(DecoranaError::EngineExecution {
                        status: format!("compiler {}", status),
                        stdout: read_lossy(&workspace.file(COMPILER_STDOUT)),
                        stderr: read_lossy(&workspace.file(COMPILER_STDERR)),
                    });
                }
                tracing::debug!("Compiled engine in {:?}", started.elapsed());
                Ok(target)
            }
        }
    }
}

/// Look a program up by path or on PATH
pub fn find_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
