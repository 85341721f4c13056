//! Tests for the midi2hands command line
//!
//! Each test works in its own temp directory with config discovery and
//! MIDI2HANDS_* variables isolated from the host.

use assert_cmd::Command;
use midly::{MidiMessage, Smf, TrackEventKind};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn make_midi(tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&480u16.to_be_bytes());

    for track in tracks {
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
        buf.extend_from_slice(track);
    }
    buf
}

/// C2 under C5, then a note-off for a pitch that never sounded.
fn piano_track() -> Vec<u8> {
    let mut track = Vec::new();
    track.extend_from_slice(&[0x00, 0x90, 36, 80]);
    track.extend_from_slice(&[0x00, 0x90, 72, 100]);
    track.extend_from_slice(&[0x83, 0x60, 0x80, 72, 64]);
    track.extend_from_slice(&[0x00, 0x80, 36, 0]);
    track.extend_from_slice(&[0x00, 0x80, 48, 0]);
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    track
}

fn write_piano(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, make_midi(&[piano_track()])).unwrap();
    path
}

fn midi2hands(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("midi2hands").unwrap();
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("MIDI2HANDS_CONFIG")
        .env_remove("MIDI2HANDS_MODEL")
        .env_remove("MIDI2HANDS_SPLIT_POINT")
        .env_remove("MIDI2HANDS_PARALLEL")
        .env_remove("MIDI2HANDS_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn note_channels(path: &Path) -> Vec<(u8, u8)> {
    let bytes = std::fs::read(path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    smf.tracks[0]
        .iter()
        .filter_map(|event| match event.kind {
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. },
            } => Some((key.as_int(), channel.as_int())),
            _ => None,
        })
        .collect()
}

#[test]
fn split_writes_default_output_next_to_input() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");

    midi2hands(&dir)
        .arg("split")
        .arg("etude.mid")
        .assert()
        .success()
        .stdout(predicate::str::contains("right: 1"))
        .stdout(predicate::str::contains("left: 1"))
        .stdout(predicate::str::contains("etude_hands.mid"));

    assert_eq!(
        note_channels(&dir.path().join("etude_hands.mid")),
        vec![(36, 1), (72, 0), (72, 0), (36, 1), (48, 0)]
    );
}

#[test]
fn split_honors_explicit_output_and_split_point() {
    let dir = TempDir::new().unwrap();
    let input = write_piano(dir.path(), "etude.mid");
    let output = dir.path().join("tagged.mid");

    // Everything sits below the split, so both notes go left.
    midi2hands(&dir)
        .arg("split")
        .arg(&input)
        .arg(&output)
        .arg("--split-point")
        .arg("100")
        .assert()
        .success()
        .stdout(predicate::str::contains("right: 0"))
        .stdout(predicate::str::contains("left: 2"));

    assert_eq!(
        note_channels(&output),
        vec![(36, 1), (72, 1), (72, 1), (36, 1), (48, 0)]
    );
}

#[test]
fn split_json_report() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");

    let output = midi2hands(&dir)
        .arg("split")
        .arg("etude.mid")
        .arg("--json")
        .output()
        .expect("Failed to execute midi2hands");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["counts"]["right"], 1);
    assert_eq!(report["counts"]["left"], 1);
    assert_eq!(report["unresolved_note_offs"], 1);
    assert_eq!(report["format"], 1);
    assert_eq!(report["ppq"], 480);
    assert_eq!(report["tracks"].as_array().map(Vec::len), Some(1));
}

#[test]
fn split_with_model_file() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");
    // Logit crosses zero at pitch 80, so both notes land left.
    std::fs::write(
        dir.path().join("model.json"),
        r#"{"weights": [0.0, -0.25, 0.0], "bias": 20.0}"#,
    )
    .unwrap();

    midi2hands(&dir)
        .arg("split")
        .arg("etude.mid")
        .arg("--model")
        .arg("model.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("left: 2"));
}

#[test]
fn split_reads_config_file() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");
    std::fs::write(
        dir.path().join("midi2hands.toml"),
        "[classifier]\nsplit_point = 30\n",
    )
    .unwrap();

    midi2hands(&dir)
        .arg("split")
        .arg("etude.mid")
        .assert()
        .success()
        .stdout(predicate::str::contains("right: 2"));
}

#[test]
fn split_rejects_bad_model() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");
    std::fs::write(dir.path().join("model.json"), "{\"weights\": [1.0]}").unwrap();

    midi2hands(&dir)
        .arg("split")
        .arg("etude.mid")
        .arg("--model")
        .arg("model.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("model.json"));

    assert!(!dir.path().join("etude_hands.mid").exists());
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();

    midi2hands(&dir)
        .arg("split")
        .arg("nowhere.mid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn garbage_input_fails_to_decode() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("noise.mid"), b"definitely not midi").unwrap();

    midi2hands(&dir)
        .arg("split")
        .arg("noise.mid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode"));
}

#[test]
fn unusual_extension_warns_but_proceeds() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.bin");

    midi2hands(&dir)
        .arg("split")
        .arg("etude.bin")
        .assert()
        .success()
        .stderr(predicate::str::contains("extension"));

    assert!(dir.path().join("etude_hands.mid").exists());
}

#[test]
fn inspect_summarizes_tracks() {
    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");

    midi2hands(&dir)
        .arg("inspect")
        .arg("etude.mid")
        .assert()
        .success()
        .stdout(predicate::str::contains("format: 1"))
        .stdout(predicate::str::contains("480 ticks per quarter note"))
        .stdout(predicate::str::contains("track 0: 6 events, 2 note-ons, channels [0]"));
}

#[test]
fn config_shows_sources_and_values() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[engine]\nparallel = true\n").unwrap();

    midi2hands(&dir)
        .arg("config")
        .arg("--config")
        .arg(&config)
        .env("MIDI2HANDS_SPLIT_POINT", "55")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"))
        .stdout(predicate::str::contains("env override: MIDI2HANDS_SPLIT_POINT"))
        .stdout(predicate::str::contains("split_point = 55"))
        .stdout(predicate::str::contains("parallel = true"));
}

#[cfg(unix)]
#[test]
fn non_utf8_environment_does_not_crash() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let dir = TempDir::new().unwrap();
    write_piano(dir.path(), "etude.mid");

    midi2hands(&dir)
        .env("LATIN1_TITLE", OsString::from_vec(vec![b'f', 0xFC, b'r']))
        .arg("inspect")
        .arg("etude.mid")
        .assert()
        .success()
        .stdout(predicate::str::contains("note-ons: 2"));
}
