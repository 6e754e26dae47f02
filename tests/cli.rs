use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use hound::{SampleFormat, WavSpec, WavWriter};
use predicates::prelude::*;
use tempfile::TempDir;

fn write_tone(dir: &Path, name: &str, seconds: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 2,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    let frames = (seconds * spec.sample_rate as f32) as usize;
    for n in 0..frames {
        let t = n as f32 / spec.sample_rate as f32;
        let sample = (0.3 * (2.0 * PI * 150.0 * t).sin() * i16::MAX as f32) as i16;
        writer.write_sample(sample).unwrap();
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn fluency_cmd(models_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("esl-fluency").unwrap();
    cmd.env_remove("FLUENCY_HF_TOKEN")
        .env_remove("WHISPER_MODEL_PATH")
        .env("FLUENCY_MODELS_DIR", models_dir)
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("esl-fluency")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn missing_file_reports_zero_score_as_json() {
    let dir = TempDir::new().unwrap();
    let output = fluency_cmd(dir.path())
        .args(["evaluate", "no-such-answer.wav"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["Fluency"], 0.0);
    assert_eq!(value["Level"], "Below Basic");
    assert_eq!(value["Error"], "Audio file is empty or invalid.");
}

#[test]
fn evaluates_without_whisper_weights() {
    let dir = TempDir::new().unwrap();
    let wav = write_tone(dir.path(), "answer.wav", 2.0);

    let output = fluency_cmd(&dir.path().join("models"))
        .arg("evaluate")
        .arg(&wav)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["N_words"], 0);
    assert!(value.get("Error").is_none());
    assert!((value["Duration"].as_f64().unwrap() - 2.0).abs() < 1e-3);
    assert!(value["Prosody_Score"].is_null());
}

#[test]
fn rejects_non_positive_thresholds() {
    let dir = TempDir::new().unwrap();
    fluency_cmd(dir.path())
        .args(["evaluate", "answer.wav", "--long-pause-sec", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("long pause threshold must be positive"));
}

#[test]
fn batch_writes_one_row_per_file() {
    let dir = TempDir::new().unwrap();
    let wav = write_tone(dir.path(), "good.wav", 1.5);
    let missing = dir.path().join("missing.wav");
    let csv_path = dir.path().join("scores.csv");

    fluency_cmd(&dir.path().join("models"))
        .arg("batch")
        .arg(&wav)
        .arg(&missing)
        .arg("--out-csv")
        .arg(&csv_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Scored 2 file(s), 1 unusable"));

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "path");
    assert_eq!(&headers[14], "Level");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0][0].ends_with("good.wav"));
    assert_eq!(&rows[1][14], "Below Basic");
    assert_eq!(&rows[1][13], "0.000");
}
