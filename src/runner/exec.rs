//! Simulation execution.
//!
//! Runs a generated script as a subprocess, captures its console output
//! into the run directory, and parses packet events plus flow statistics
//! out of stdout.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::trace::{
    compute_stats, parse_console_stats, parse_str, FlowStats, PacketEvent, TraceParseError,
    TraceStats,
};
use tracing::info;

use super::detect::Ns3Install;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no ns-3 installation configured")]
    Ns3NotFound,

    #[error("failed to spawn {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("simulation exited with {code:?}: {stderr}")]
    Ns3Failed { code: Option<i32>, stderr: String },

    #[error(transparent)]
    Trace(#[from] TraceParseError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy script to {path}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How the script is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Copy into `scratch/` and go through the `ns3` launcher.
    Ns3Cli,
    /// Invoke the interpreter directly; the ns-3 Python bindings must be
    /// importable from the environment.
    #[default]
    PythonBindings,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub events: Vec<PacketEvent>,
    pub flow_stats: Vec<FlowStats>,
    pub stats: TraceStats,
    pub console: String,
}

pub struct Ns3Runner {
    install: Option<Ns3Install>,
    mode: RunMode,
    python: String,
}

impl Ns3Runner {
    pub fn new(install: Option<Ns3Install>) -> Self {
        Ns3Runner {
            install,
            mode: RunMode::default(),
            python: "python3".to_string(),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Run `script`, writing console.log / stderr.log into `run_dir`.
    pub fn run_script(&self, script: &Path, run_dir: &Path) -> Result<RunOutcome, RunError> {
        info!(script = %script.display(), "▶️ 开始运行仿真");
        let output = match self.mode {
            RunMode::PythonBindings => self.run_python(script, run_dir)?,
            RunMode::Ns3Cli => self.run_ns3_cli(script)?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        write_log(run_dir.join("console.log"), &stdout)?;
        write_log(run_dir.join("stderr.log"), &stderr)?;

        if !output.status.success() {
            return Err(RunError::Ns3Failed {
                code: output.status.code(),
                stderr,
            });
        }

        let events = parse_str(&stdout)?;
        let flow_stats = parse_console_stats(&stdout);
        let stats = compute_stats(&events);
        info!(
            events = events.len(),
            flows = flow_stats.len(),
            "✅ 仿真完成"
        );
        Ok(RunOutcome {
            events,
            flow_stats,
            stats,
            console: stdout,
        })
    }

    fn run_python(&self, script: &Path, run_dir: &Path) -> Result<std::process::Output, RunError> {
        let mut command = Command::new(&self.python);
        command.arg(script).current_dir(run_dir);
        if let Some(install) = &self.install {
            // bindings live under build/bindings/python in a built tree
            command.env("PYTHONPATH", install.root.join("build").join("bindings").join("python"));
        }
        command.output().map_err(|source| RunError::Spawn {
            command: self.python.clone(),
            source,
        })
    }

    fn run_ns3_cli(&self, script: &Path) -> Result<std::process::Output, RunError> {
        let install = self.install.as_ref().ok_or(RunError::Ns3NotFound)?;
        let name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "simulation.py".to_string());
        let scratch = install.root.join("scratch").join(&name);
        std::fs::copy(script, &scratch).map_err(|source| RunError::Copy {
            path: scratch.clone(),
            source,
        })?;
        Command::new("./ns3")
            .arg("run")
            .arg(format!("scratch/{name}"))
            .current_dir(&install.root)
            .output()
            .map_err(|source| RunError::Spawn {
                command: "./ns3".to_string(),
                source,
            })
    }
}

fn write_log(path: PathBuf, content: &str) -> Result<(), RunError> {
    std::fs::write(&path, content).map_err(|source| RunError::Write { path, source })
}
