//! Project directory persistence.

mod store;

pub use store::{
    Project, ProjectError, ProjectMeta, RunRecord, RunStatus, FAILURES_FILE, FLOWS_FILE,
    PROJECT_FILE, PROJECT_SCHEMA_VERSION, RESULTS_DIR, SCRIPTS_DIR, TOPOLOGY_FILE,
};
