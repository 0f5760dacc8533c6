// tests/cli_test.rs
//
// Drives the built binary end to end with a fixed threshold.

mod test_utils;

use serde_json::Value;
use std::fs;
use test_utils::*;

#[test]
fn test_json_submissions_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    write_wav_i16(&input.join("a.wav"), &chord(&[220.0, 330.0], 6.0, 16000), 16000, 1);
    fs::write(input.join("b.wav"), b"not audio").unwrap();
    fs::write(input.join("readme.txt"), b"ignored").unwrap();

    let output = run_audioproof([
        input.to_str().unwrap(),
        "--json",
        "--no-ledger",
        "--threshold",
        "0.5",
        "--dlp-id",
        "42",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let records: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["status"], "accepted");
    assert_eq!(records[0]["proof"]["score"], 1.0);
    assert_eq!(records[0]["proof"]["metadata"]["dlp_id"], "42");
    assert_eq!(records[0]["payout"], 100.0);
    assert_eq!(records[1]["status"], "unreadable");
}

#[test]
fn test_ledger_file_dedups_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.wav");
    let ledger = dir.path().join("ledger.json");
    write_wav_i16(&clip, &chord(&[220.0, 330.0], 6.0, 16000), 16000, 1);

    let args = [
        clip.to_str().unwrap(),
        "--json",
        "--threshold",
        "0.5",
        "--ledger",
        ledger.to_str().unwrap(),
    ];

    let first: Vec<Value> = serde_json::from_slice(&run_audioproof(args).stdout).unwrap();
    assert_eq!(first[0]["status"], "accepted");
    assert!(ledger.exists());

    let second: Vec<Value> = serde_json::from_slice(&run_audioproof(args).stdout).unwrap();
    assert_eq!(second[0]["status"], "duplicate");
    assert_eq!(second[0]["previous"]["status"], "processed");
}

#[test]
fn test_batch_proof_json() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    write_wav_i16(&a, &sine(300.0, 2.0, 16000, 0.5), 16000, 1);
    write_wav_i16(&b, &sine(500.0, 2.0, 16000, 0.5), 16000, 1);

    let output = run_audioproof([
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--batch",
        "--json",
        "--no-ledger",
        "--threshold",
        "0.5",
    ]);
    assert!(output.status.success());

    let proof: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(proof["attributes"]["total_score"], 2.0);
    assert_eq!(proof["valid"], true);
    assert_eq!(proof["authenticity"], 0.3);
    assert!(proof["metadata"].get("dlp_id").is_none());
}

#[test]
fn test_no_inputs_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_audioproof([dir.path().to_str().unwrap(), "--no-ledger", "--threshold", "0.5"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No audio files found!"));
}
