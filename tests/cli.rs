use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const REPORT: &str = "\
Main activities
The company produces and refines crude oil and natural gas in the western region.
It also operates a network of filling stations across the country.
Share capital
The charter capital is 724,934,300 shares with a nominal value of one hundred each.
The majority shareholder holds ninety percent of the voting shares.
History
1994
The company was founded as a joint venture with a foreign partner.
Projects
Construction of the northern gas pipeline
The pipeline connects the western fields with the domestic distribution network.
- Phase one covers three hundred kilometres of trunk line
";

/// Data dir with a small-document config and the report on disk
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("report.txt"), REPORT).unwrap();
    fs::write(
        dir.path().join("docqa.toml"),
        "[chunking]\nmin_words = 5\nmax_words = 60\n\n[embedding]\ndimension = 128\n",
    )
    .unwrap();
    dir
}

fn docqa(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docqa").unwrap();
    cmd.env_remove("RUST_LOG").arg("--data-dir").arg(data_dir);
    cmd
}

fn build(data_dir: &Path) {
    docqa(data_dir)
        .arg("build")
        .arg(data_dir.join("report.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 4 chunks"));
}

#[test]
fn chunk_prints_statistics() {
    let dir = workspace();

    docqa(dir.path())
        .arg("chunk")
        .arg(dir.path().join("report.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Chunks:      4"))
        .stdout(predicate::str::contains("Share capital"));
}

#[test]
fn chunk_json_lists_chunks() {
    let dir = workspace();

    let output = docqa(dir.path())
        .arg("chunk")
        .arg(dir.path().join("report.txt"))
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let chunks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[1]["sections"][0], "Share capital");
}

#[test]
fn build_then_search_finds_capital() {
    let dir = workspace();
    build(dir.path());

    docqa(dir.path())
        .args(["search", "how many shares", "--top-k", "1", "--min-score", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Share capital"))
        .stdout(predicate::str::contains("724,934,300"));
}

#[test]
fn search_json_output() {
    let dir = workspace();
    build(dir.path());

    let output = docqa(dir.path())
        .args(["search", "how many shares", "--top-k", "1", "--min-score", "0", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["section_labels"][0], "Share capital");
}

#[test]
fn search_reports_empty_result() {
    let dir = workspace();
    build(dir.path());

    docqa(dir.path())
        .args(["search", "how many shares", "--min-score", "1.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found"));
}

#[test]
fn search_without_index_fails() {
    let dir = workspace();

    docqa(dir.path())
        .args(["search", "how many shares"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn build_falls_back_when_index_dir_is_unwritable() {
    let dir = workspace();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    docqa(dir.path())
        .arg("build")
        .arg(dir.path().join("report.txt"))
        .arg("--index-dir")
        .arg(blocker.join("index"))
        .assert()
        .success()
        .stdout(predicate::str::contains("used fallback"))
        .stderr(predicate::str::contains("Index saved to fallback"));

    assert!(dir.path().join("index_fallback").join("manifest.json").exists());
}

#[test]
fn stats_after_build() {
    let dir = workspace();
    build(dir.path());

    docqa(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:    4"))
        .stdout(predicate::str::contains("hashing-fnv1a-128"));
}

#[test]
fn verbose_build_logs_progress() {
    let dir = workspace();

    docqa(dir.path())
        .arg("-v")
        .arg("build")
        .arg(dir.path().join("report.txt"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Building index from"));
}

#[test]
fn chunk_missing_file_names_the_path() {
    let dir = workspace();

    docqa(dir.path())
        .arg("chunk")
        .arg(dir.path().join("absent.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"))
        .stderr(predicate::str::contains("absent.txt"));
}

#[test]
fn build_rejects_document_without_chunks() {
    let dir = workspace();
    fs::write(dir.path().join("tiny.txt"), "History\n").unwrap();

    docqa(dir.path())
        .arg("build")
        .arg(dir.path().join("tiny.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No chunks produced"));
}
