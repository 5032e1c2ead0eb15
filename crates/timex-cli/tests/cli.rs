use assert_cmd::Command;
use predicates::prelude::*;

const NOW: &str = "2009-11-20T10:30:00";

fn timex() -> Command {
    let mut cmd = Command::cargo_bin("timex").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_resolve_today_offset() {
    timex()
        .args(["resolve", "today+3", "--now", NOW])
        .assert()
        .success()
        .stdout("2009-11-23\n");
}

#[test]
fn test_resolve_today_in_minute_domain_counts_days() {
    timex()
        .args(["resolve", "today-20", "--domain", "minute", "--now", NOW])
        .assert()
        .success()
        .stdout("2009-10-31T00:00\n");
}

#[test]
fn test_resolve_json() {
    let output = timex()
        .args(["resolve", "TODAY+1", "--domain", "workweek", "--now", NOW, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["expression"], "today+1");
    assert_eq!(json["domain"], "workweek");
    assert_eq!(json["date"], "2009-11-23");
}

#[test]
fn test_resolve_keyword_against_context() {
    timex()
        .args([
            "resolve",
            "start+1",
            "--context-begin",
            "2009-11-01",
            "--context-end",
            "2009-11-30",
        ])
        .assert()
        .success()
        .stdout("2009-11-02\n");
}

#[test]
fn test_resolve_keyword_without_context_fails() {
    timex()
        .args(["resolve", "end"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot resolve 'end'"));
}

#[test]
fn test_resolve_malformed_offset_fails() {
    timex()
        .args(["resolve", "2005-05-15+1--1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid expression"))
        .stderr(predicate::str::contains("+1--1"));
}

#[test]
fn test_range_in_workweek_context() {
    timex()
        .args([
            "range",
            "--begin",
            "end-5",
            "--end",
            "end",
            "--domain",
            "workweek",
            "--context-begin",
            "2009-11-19",
            "--context-end",
            "2009-11-20",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("range: [2009-11-13, 2009-11-20]"));
}

#[test]
fn test_range_repairs_inverted_input() {
    timex()
        .args(["range", "--begin", "2009-11-25", "--end", "2009-11-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("begin: 2009-11-20"))
        .stdout(predicate::str::contains("range: [2009-11-20, 2009-11-20]"));
}

#[test]
fn test_range_json_with_today() {
    let output = timex()
        .args([
            "range", "--begin", "today", "--end", "today+2", "--now", NOW, "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["begin"], "today");
    assert_eq!(json["end"], "today+2");
    assert_eq!(json["lower"], "2009-11-20");
    assert_eq!(json["upper"], "2009-11-22");
}

#[test]
fn test_context_cannot_use_keywords() {
    timex()
        .args([
            "range",
            "--begin",
            "start",
            "--end",
            "end",
            "--context-begin",
            "start",
            "--context-end",
            "2009-11-30",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("context bounds cannot use start/end"));
}

#[test]
fn test_config_limits_offset_terms() {
    let path = std::env::temp_dir().join(format!("timex-cli-test-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "max_offset_terms": 1 }"#).unwrap();

    timex()
        .args(["resolve", "today+1+1", "--now", NOW, "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than 1"));
    timex()
        .args(["resolve", "today+2", "--now", NOW, "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout("2009-11-22\n");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_unknown_domain_rejected() {
    timex()
        .args(["resolve", "today", "--domain", "fortnight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fortnight"));
}
