//! Project persistence.
//!
//! A project is a directory:
//!
//! ```text
//! myproject/
//!   project.json     metadata + run history
//!   topology.json    NetworkModel
//!   flows.json       SimulationConfig
//!   failures.json    FailureScenario (optional)
//!   scripts/         generated ns-3 scripts
//!   results/         one run_<timestamp>/ directory per run
//! ```

use std::path::{Path, PathBuf};

use crate::model::{FailureScenario, ModelError, NetworkModel, SimulationConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const PROJECT_SCHEMA_VERSION: u32 = 1;

pub const PROJECT_FILE: &str = "project.json";
pub const TOPOLOGY_FILE: &str = "topology.json";
pub const FLOWS_FILE: &str = "flows.json";
pub const FAILURES_FILE: &str = "failures.json";
pub const SCRIPTS_DIR: &str = "scripts";
pub const RESULTS_DIR: &str = "results";

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("{0} is not a project directory (missing {PROJECT_FILE})")]
    NotAProject(PathBuf),

    #[error("{0} already exists and is not empty")]
    NotEmpty(PathBuf),

    #[error("unsupported project schema version {0}")]
    SchemaVersion(u32),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// One simulation run, as remembered in the project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub started_at: String,
    /// Run directory relative to the project root.
    pub dir: String,
    /// Script name relative to the project root.
    pub script: String,
    pub status: RunStatus,
    #[serde(default)]
    pub events: usize,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

fn default_schema_version() -> u32 {
    PROJECT_SCHEMA_VERSION
}

#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    pub meta: ProjectMeta,
    pub network: NetworkModel,
    pub config: SimulationConfig,
    pub failures: Option<FailureScenario>,
}

impl Project {
    /// Create a fresh project directory. Refuses a non-empty target.
    pub fn create(root: &Path, name: &str) -> Result<Self, ProjectError> {
        if root.exists() && root.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false) {
            return Err(ProjectError::NotEmpty(root.to_path_buf()));
        }
        for dir in [root.to_path_buf(), root.join(SCRIPTS_DIR), root.join(RESULTS_DIR)] {
            std::fs::create_dir_all(&dir).map_err(|source| ProjectError::Write {
                path: dir.clone(),
                source,
            })?;
        }
        let now = now_stamp();
        let project = Project {
            root: root.to_path_buf(),
            meta: ProjectMeta {
                schema_version: PROJECT_SCHEMA_VERSION,
                name: name.to_string(),
                description: String::new(),
                created_at: now.clone(),
                modified_at: now,
                runs: Vec::new(),
            },
            network: NetworkModel::default(),
            config: SimulationConfig::default(),
            failures: None,
        };
        project.save()?;
        info!(path = %root.display(), name, "📁 项目已创建");
        Ok(project)
    }

    /// Open an existing project directory.
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let meta_path = root.join(PROJECT_FILE);
        if !meta_path.is_file() {
            return Err(ProjectError::NotAProject(root.to_path_buf()));
        }
        let raw = std::fs::read_to_string(&meta_path).map_err(|source| ProjectError::Read {
            path: meta_path,
            source,
        })?;
        let meta: ProjectMeta = serde_json::from_str(&raw)?;
        if meta.schema_version > PROJECT_SCHEMA_VERSION {
            return Err(ProjectError::SchemaVersion(meta.schema_version));
        }
        let network = NetworkModel::load(&root.join(TOPOLOGY_FILE))?;
        let config = SimulationConfig::load(&root.join(FLOWS_FILE))?;
        let failures_path = root.join(FAILURES_FILE);
        let failures = if failures_path.is_file() {
            Some(FailureScenario::load(&failures_path)?)
        } else {
            None
        };
        info!(path = %root.display(), name = meta.name, runs = meta.runs.len(), "📂 项目已打开");
        Ok(Project {
            root: root.to_path_buf(),
            meta,
            network,
            config,
            failures,
        })
    }

    /// Persist metadata, topology and flows. Metadata goes through a
    /// temp-file rename so a crash cannot leave a torn project.json.
    pub fn save(&self) -> Result<(), ProjectError> {
        let mut meta = self.meta.clone();
        meta.modified_at = now_stamp();
        let raw = serde_json::to_string_pretty(&meta)?;
        let tmp = self.root.join(format!("{PROJECT_FILE}.tmp"));
        std::fs::write(&tmp, raw).map_err(|source| ProjectError::Write {
            path: tmp.clone(),
            source,
        })?;
        let dst = self.root.join(PROJECT_FILE);
        std::fs::rename(&tmp, &dst).map_err(|source| ProjectError::Write {
            path: dst,
            source,
        })?;

        self.network.save(&self.root.join(TOPOLOGY_FILE))?;
        self.config.save(&self.root.join(FLOWS_FILE))?;
        if let Some(failures) = &self.failures {
            failures.save(&self.root.join(FAILURES_FILE))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join(SCRIPTS_DIR)
    }

    /// Create a timestamped results directory for a new run.
    pub fn new_run_dir(&self) -> Result<PathBuf, ProjectError> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let dir = self.root.join(RESULTS_DIR).join(format!("run_{stamp}"));
        std::fs::create_dir_all(&dir).map_err(|source| ProjectError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Append a run to the history and persist the metadata.
    pub fn record_run(&mut self, record: RunRecord) -> Result<(), ProjectError> {
        self.meta.runs.push(record);
        self.save()
    }

    pub fn last_run(&self) -> Option<&RunRecord> {
        self.meta.runs.last()
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
