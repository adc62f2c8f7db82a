use crate::model::{ChannelKind, NodeKind};
use crate::project::{Project, ProjectError, RunRecord, RunStatus};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    std::env::temp_dir().join(format!("ns3lab-{prefix}-{}-{nanos}", std::process::id()))
}

#[test]
fn create_save_open_round_trip() {
    let root = unique_temp_dir("roundtrip");
    let mut project = Project::create(&root, "campus").expect("create");

    let a = project.network.add_node(NodeKind::Host);
    let b = project.network.add_node(NodeKind::Router);
    project.network.add_link(a, b, ChannelKind::PointToPoint).expect("link");
    project.config.add_flow(a, b);
    project.save().expect("save");

    let reopened = Project::open(&root).expect("open");
    assert_eq!(reopened.meta.name, "campus");
    assert_eq!(reopened.network.nodes.len(), 2);
    assert_eq!(reopened.network.links.len(), 1);
    assert_eq!(reopened.config.flows.len(), 1);
    assert!(reopened.failures.is_none());

    assert!(root.join("project.json").is_file());
    assert!(root.join("topology.json").is_file());
    assert!(root.join("flows.json").is_file());
    assert!(root.join("scripts").is_dir());
    assert!(root.join("results").is_dir());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn create_refuses_non_empty_directory() {
    let root = unique_temp_dir("nonempty");
    std::fs::create_dir_all(&root).expect("mkdir");
    std::fs::write(root.join("junk.txt"), "hello").expect("write");

    let err = Project::create(&root, "clobber").expect_err("non-empty target");
    assert!(matches!(err, ProjectError::NotEmpty(_)));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn open_requires_project_file() {
    let root = unique_temp_dir("noproject");
    std::fs::create_dir_all(&root).expect("mkdir");

    let err = Project::open(&root).expect_err("missing project.json");
    assert!(matches!(err, ProjectError::NotAProject(_)));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn run_records_survive_reopen() {
    let root = unique_temp_dir("runs");
    let mut project = Project::create(&root, "runs").expect("create");

    let run_dir = project.new_run_dir().expect("run dir");
    assert!(run_dir.is_dir());
    assert!(run_dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("run_")));

    project
        .record_run(RunRecord {
            started_at: "2026-01-01 00:00:00".to_string(),
            dir: "results/run_20260101_000000".to_string(),
            script: "scripts/simulation.py".to_string(),
            status: RunStatus::Completed,
            events: 42,
            exit_code: Some(0),
        })
        .expect("record");

    let reopened = Project::open(&root).expect("open");
    assert_eq!(reopened.meta.runs.len(), 1);
    let run = reopened.last_run().expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.events, 42);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn failure_scenario_is_persisted_when_present() {
    let root = unique_temp_dir("failures");
    let mut project = Project::create(&root, "failures").expect("create");
    project.failures = Some(crate::model::FailureScenario {
        name: "outage".to_string(),
        events: Vec::new(),
    });
    project.save().expect("save");

    assert!(root.join("failures.json").is_file());
    let reopened = Project::open(&root).expect("open");
    assert_eq!(reopened.failures.expect("scenario").name, "outage");

    let _ = std::fs::remove_dir_all(&root);
}
