use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ns3lab-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const TRACE: &str = "\
SIMULATION START
PKT|0|TX|0|0|512|0|1|link_0|ppp
PKT|1000000|ENQ|0|0|512|0|1|link_0|ppp
PKT|2000000|RX|1|0|512|0|1|link_0|ppp
PKT|3000000|DROP|1|0|256|-1|-1|link_0|ppp
SIMULATION DONE
";

#[test]
fn trace_play_lists_events_by_default() {
    let dir = unique_temp_dir("trace-play-list");
    let trace = write_file(&dir, "trace.log", TRACE);

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args(["--trace", trace.to_str().unwrap()])
        .output()
        .expect("run trace_play");
    assert!(
        output.status.success(),
        "trace_play failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.contains("TX node=0"));
    assert!(stdout.contains("DROP node=1"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn trace_play_stats_summarizes_the_trace() {
    let dir = unique_temp_dir("trace-play-stats");
    let trace = write_file(&dir, "trace.log", TRACE);

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args(["--trace", trace.to_str().unwrap(), "--stats"])
        .output()
        .expect("run trace_play");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("events:   4"));
    assert!(stdout.contains("tx:       1 (512 bytes)"));
    assert!(stdout.contains("rx:       1 (512 bytes)"));
    assert!(stdout.contains("dropped:  1"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn trace_play_exports_events_json() {
    let dir = unique_temp_dir("trace-play-json");
    let trace = write_file(&dir, "trace.log", TRACE);
    let out_json = dir.join("events.json");

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args([
            "--trace",
            trace.to_str().unwrap(),
            "--events-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run trace_play");
    assert!(output.status.success());

    let raw = fs::read_to_string(&out_json).expect("read events.json");
    let v: Value = serde_json::from_str(&raw).expect("parse events.json");
    let arr = v.as_array().expect("events.json must be an array");
    assert_eq!(arr.len(), 4);
    assert_eq!(arr[0].get("kind").and_then(|k| k.as_str()), Some("tx"));
    assert_eq!(arr[0].get("time_ns").and_then(|t| t.as_u64()), Some(0));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn trace_play_replays_the_whole_trace() {
    let dir = unique_temp_dir("trace-play-replay");
    let trace = write_file(&dir, "trace.log", TRACE);

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args([
            "--trace",
            trace.to_str().unwrap(),
            "--replay",
            "--speed",
            "100",
        ])
        .output()
        .expect("run trace_play");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4, "stdout: {stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn trace_play_window_filters_events() {
    let dir = unique_temp_dir("trace-play-window");
    let trace = write_file(&dir, "trace.log", TRACE);

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args([
            "--trace",
            trace.to_str().unwrap(),
            "--from",
            "0.001",
            "--to",
            "0.002",
        ])
        .output()
        .expect("run trace_play");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2, "stdout: {stdout}");
    assert!(stdout.contains("ENQ"));
    assert!(stdout.contains("RX"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn trace_play_exits_nonzero_on_malformed_trace() {
    let dir = unique_temp_dir("trace-play-bad");
    let trace = write_file(&dir, "trace.log", "PKT|oops|TX|0\n");

    let output = Command::new(env!("CARGO_BIN_EXE_trace_play"))
        .args(["--trace", trace.to_str().unwrap()])
        .output()
        .expect("run trace_play");
    assert!(!output.status.success(), "expected non-zero exit");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}
