#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use depot_signer::KeyPair;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with_extra_config("")
    }

    fn with_extra_config(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("depot.toml");
        let root = dir.path().display();
        fs::write(
            &config,
            format!(
                r#"
[storage]
type = "filesystem"
path = "{root}/chunks"

[metadata]
type = "sqlite"
path = "{root}/metadata.db"

{extra}
"#
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn depotctl(&self) -> Command {
        let mut cmd = Command::cargo_bin("depotctl").unwrap();
        cmd.env("RUST_LOG", "warn").arg("--config").arg(&self.config);
        cmd
    }

    fn ingest(&self, path: &Path, extra: &[&str]) -> Value {
        let output = self
            .depotctl()
            .arg("ingest")
            .arg(path)
            .args(extra)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "ingest failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[test]
fn test_ingest_then_fetch_roundtrips() {
    let ws = Workspace::new();
    let input = ws.path("input.bin");
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 97) as u8).collect();
    fs::write(&input, &data).unwrap();

    let summary = ws.ingest(&input, &["--chunk-size", "4096", "--mime-type", "application/x-test"]);
    assert_eq!(summary["total_size"], 20_000);
    assert_eq!(summary["chunk_count"], 5);
    assert_eq!(summary["created"], true);
    let cid = summary["cid"].as_str().unwrap().to_string();

    let output = ws.path("output.bin");
    ws.depotctl()
        .arg("fetch")
        .arg(&cid)
        .arg("--output")
        .arg(&output)
        .arg("--verify")
        .assert()
        .success()
        .stderr(contains("input.bin"))
        .stderr(contains("application/x-test"));

    assert_eq!(fs::read(&output).unwrap(), data);
}

#[test]
fn test_fetch_writes_to_stdout() {
    let ws = Workspace::new();
    let input = ws.path("hello.txt");
    fs::write(&input, b"hello world").unwrap();

    let summary = ws.ingest(&input, &[]);
    let cid = summary["cid"].as_str().unwrap();
    assert_eq!(summary["merkle_root"], summary["chunk_hashes"][0]);

    ws.depotctl()
        .arg("fetch")
        .arg(cid)
        .assert()
        .success()
        .stdout("hello world");
}

#[test]
fn test_duplicate_content_is_stored_once() {
    let ws = Workspace::new();
    let first = ws.path("first.txt");
    let second = ws.path("second.txt");
    fs::write(&first, b"abcabc").unwrap();
    fs::write(&second, b"abcxyz").unwrap();

    ws.ingest(&first, &["--chunk-size", "3"]);
    ws.ingest(&second, &["--chunk-size", "3"]);

    let output = ws.depotctl().arg("stats").output().unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["chunk_count"], 2);
    assert_eq!(stats["stored_bytes"], 6);
    assert_eq!(stats["file_count"], 2);
    assert_eq!(stats["logical_bytes"], 12);
    assert_eq!(stats["chunk_references"], 4);
    assert_eq!(stats["dedup_ratio"], 2.0);
}

#[test]
fn test_ingest_reads_stdin() {
    let ws = Workspace::new();

    let output = ws
        .depotctl()
        .arg("ingest")
        .arg("-")
        .arg("--filename")
        .arg("piped.txt")
        .write_stdin("from a pipe")
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_size"], 11);
}

#[test]
fn test_proof_reports_match() {
    let ws = Workspace::new();
    let input = ws.path("proof.txt");
    fs::write(&input, b"some bytes worth proving").unwrap();
    let summary = ws.ingest(&input, &["--chunk-size", "5"]);
    let cid = summary["cid"].as_str().unwrap();

    let output = ws.depotctl().arg("proof").arg(cid).output().unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["matches"], true);
    assert_eq!(report["chunk_count"], 5);
    assert_eq!(report["stored_root"], summary["merkle_root"]);
}

#[tokio::test]
async fn test_proof_fails_on_tampered_root() {
    let ws = Workspace::new();
    let input = ws.path("tampered.txt");
    fs::write(&input, b"abcdefghi").unwrap();
    let summary = ws.ingest(&input, &["--chunk-size", "3"]);
    let cid = summary["cid"].as_str().unwrap().to_string();

    let db = format!("sqlite:{}", ws.path("metadata.db").display());
    let pool = sqlx::SqlitePool::connect(&db).await.unwrap();
    sqlx::query("UPDATE files SET merkle_root = ? WHERE cid = ?")
        .bind("0".repeat(64))
        .bind(&cid)
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    ws.depotctl()
        .arg("proof")
        .arg(&cid)
        .assert()
        .failure()
        .stdout(contains("\"matches\": false"))
        .stderr(contains("integrity mismatch"));
}

#[test]
fn test_signed_ingest_records_receipt() {
    let keypair = KeyPair::from_seed("cli-test-1", &[3u8; 32]);
    let ws = Workspace::with_extra_config(&format!(
        r#"
[signing]
key_name = "cli-test-1"

[signing.private_key]
type = "value"
key = "{}"
"#,
        keypair.to_encoded_secret_key()
    ));

    let input = ws.path("signed.txt");
    fs::write(&input, b"please sign").unwrap();
    let summary = ws.ingest(&input, &["--sign"]);
    let signature = summary["receipt"]["signature"].as_str().unwrap();
    assert!(signature.starts_with("cli-test-1:"));
    assert_eq!(summary["receipt"]["payload"]["receipt_type"], "ingest");

    let cid = summary["cid"].as_str().unwrap();
    let output = ws.depotctl().arg("receipts").arg(cid).output().unwrap();
    assert!(output.status.success());
    let receipts: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(receipts.as_array().unwrap().len(), 1);
    assert_eq!(receipts[0]["signature"], signature);
}

#[test]
fn test_fetch_unknown_cid_fails() {
    let ws = Workspace::new();

    ws.depotctl()
        .arg("fetch")
        .arg("ab".repeat(32))
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn test_malformed_cid_is_rejected_by_argument_parsing() {
    let ws = Workspace::new();

    ws.depotctl()
        .arg("proof")
        .arg("not-a-cid")
        .assert()
        .failure()
        .stderr(contains("invalid value"));
}

#[test]
fn test_invalid_chunk_size_fails() {
    let ws = Workspace::new();
    let input = ws.path("small.txt");
    fs::write(&input, b"x").unwrap();

    ws.depotctl()
        .arg("ingest")
        .arg(&input)
        .arg("--chunk-size")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("invalid chunk size"));
}

#[test]
fn test_stats_metrics_prints_prometheus_text() {
    let ws = Workspace::new();

    ws.depotctl()
        .arg("stats")
        .arg("--metrics")
        .assert()
        .success()
        .stdout(contains("depot_chunks_written_total"))
        .stdout(contains("depot_integrity_failures_total"));
}

#[test]
fn test_s3_without_bucket_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("depot.toml");
    fs::write(
        &config,
        format!(
            "[storage]\ntype = \"s3\"\n\n[metadata]\ntype = \"sqlite\"\npath = \"{}/metadata.db\"\n",
            dir.path().display()
        ),
    )
    .unwrap();

    Command::cargo_bin("depotctl")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .assert()
        .failure()
        .stderr(contains("bucket"));
}

#[test]
fn test_environment_overrides_config_file() {
    let ws = Workspace::new();
    let input = ws.path("env.txt");
    fs::write(&input, b"abcabc").unwrap();

    let output = ws
        .depotctl()
        .env("DEPOT_INGEST__DEFAULT_CHUNK_SIZE", "3")
        .arg("ingest")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["chunk_count"], 2);
    assert_eq!(summary["deduplicated_chunks"], 1);
}
