// Drives the compiled binary end to end: simulate a session, then browse,
// export and delete its log. Every run points at a temp log dir and config.

use std::fs;
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

const SCRIPT: &str = "1/4\n1/4\n2/4\n2/4\n3/4\n4/4\nend\n";
const LOG_NAME: &str = "log_2024-03-01_10-01-45.json";

fn slidehelm(root: &Path, args: &[&str]) -> Output {
    Command::cargo_bin("slidehelm")
        .unwrap()
        .arg("--log-dir")
        .arg(root.join("logs"))
        .arg("--config")
        .arg(root.join("config.json"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn simulate(root: &Path) -> Output {
    let script = root.join("talk.txt");
    fs::write(&script, SCRIPT).unwrap();
    slidehelm(
        root,
        &[
            "simulate",
            "--script",
            script.to_str().unwrap(),
            "--minutes",
            "1",
            "--step-secs",
            "15",
            "--start",
            "2024-03-01 10:00:00",
        ],
    )
}

#[test]
fn simulate_prints_status_and_saves_log() {
    let dir = tempfile::tempdir().unwrap();
    let out = simulate(dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let text = stdout(&out);
    assert!(text.contains("[0:45 left] slide 1/4 (target 1)"), "{text}");
    assert!(text.contains("Average time per slide: 20.00s"));
    assert!(text.contains("Longest on slide: 2 (30s)"));
    assert!(text.contains("Over time by 0:15"));
    assert!(text.contains("Pacing: on track 100%"));
    assert!(dir.path().join("logs").join(LOG_NAME).is_file());
}

#[test]
fn logs_list_show_export_delete() {
    let dir = tempfile::tempdir().unwrap();
    assert!(simulate(dir.path()).status.success());

    let out = slidehelm(dir.path(), &["logs", "list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), format!("{LOG_NAME} | 1 min | 4 slides"));

    let out = slidehelm(dir.path(), &["logs", "show"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("Started: 2024-03-01 10:00:00"), "{text}");
    assert!(text.contains("Samples: 5, used 1:15 of 1:00"));
    assert!(text.contains("slide   2: 30s"));

    let out = slidehelm(
        dir.path(),
        &["logs", "export", "log_2024-03-01_10-01-45", "--dwell"],
    );
    assert!(out.status.success());
    assert_eq!(stdout(&out), "slide,seconds\n1,15\n2,30\n3,15\n");

    let csv_path = dir.path().join("samples.csv");
    let out = slidehelm(
        dir.path(),
        &["logs", "export", "--out", csv_path.to_str().unwrap()],
    );
    assert!(out.status.success());
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("timestamp,elapsed_seconds,slide,pacing\n"));
    assert!(csv.contains("2024-03-01 10:00:15,15,1,on track"));
    assert_eq!(csv.lines().count(), 6);

    let out = slidehelm(dir.path(), &["logs", "delete", LOG_NAME]);
    assert!(out.status.success());
    let out = slidehelm(dir.path(), &["logs", "list"]);
    assert!(stdout(&out).starts_with("No session logs"));
}

#[test]
fn show_of_missing_log_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = slidehelm(dir.path(), &["logs", "show", "log_1999-01-01_00-00-00"]);
    assert!(!out.status.success());

    let out = slidehelm(dir.path(), &["logs", "show"]);
    assert!(!out.status.success());
}

#[test]
fn empty_script_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("short.txt");
    fs::write(&script, "2/9\nend\n").unwrap();

    let out = slidehelm(
        dir.path(),
        &["simulate", "--script", script.to_str().unwrap(), "-q"],
    );
    assert!(out.status.success());
    assert!(stdout(&out).contains("nothing saved"));
    assert!(!dir.path().join("logs").exists());
}

#[test]
fn config_set_persists_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let out = slidehelm(dir.path(), &["config", "set", "--minutes", "25"]);
    assert!(out.status.success());

    let saved = fs::read_to_string(dir.path().join("config.json")).unwrap();
    let cfg: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(cfg["duration_minutes"], 25);
    assert_eq!(cfg["sample_interval_ms"], 1000);

    let out = slidehelm(dir.path(), &["config", "show"]);
    assert!(stdout(&out).contains("\"duration_minutes\": 25"));
}
