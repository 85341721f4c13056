//! CLI command implementations

use anyhow::{Context, Result};
use handsconf::{ConfigSources, HandsConfig};
use midi_hands::{
    assign_hands, Assignment, HandClassifier, LogisticModel, Recording, SplitPointClassifier,
};
use midly::Timing;
use serde_json::json;
use std::path::{Path, PathBuf};

type BoxedClassifier = Box<dyn HandClassifier + Send + Sync>;

/// Model file if one is configured, keyboard split otherwise.
fn build_classifier(config: &HandsConfig) -> Result<BoxedClassifier> {
    match &config.classifier.model {
        Some(path) => {
            let model = LogisticModel::load(path)?;
            tracing::info!(model = %path.display(), "scoring notes with logistic model");
            Ok(Box::new(model))
        }
        None => {
            tracing::info!(
                split_point = config.classifier.split_point,
                "scoring notes with keyboard split"
            );
            Ok(Box::new(SplitPointClassifier::new(
                config.classifier.split_point,
            )))
        }
    }
}

/// `song.mid` becomes `song_hands.mid` in the same directory.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_hands.mid"))
}

fn has_midi_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
}

fn read_midi(input: &Path) -> Result<Vec<u8>> {
    if !has_midi_extension(input) {
        tracing::warn!(
            input = %input.display(),
            "input does not have a .mid or .midi extension"
        );
    }
    std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

#[cfg(feature = "parallel")]
fn run_assignment<'a>(
    recording: &Recording<'a>,
    classifier: &(dyn HandClassifier + Send + Sync),
    parallel: bool,
) -> midi_hands::Result<Assignment<'a>> {
    if parallel {
        midi_hands::assign_hands_parallel(recording, classifier)
    } else {
        assign_hands(recording, classifier)
    }
}

#[cfg(not(feature = "parallel"))]
fn run_assignment<'a>(
    recording: &Recording<'a>,
    classifier: &(dyn HandClassifier + Send + Sync),
    parallel: bool,
) -> midi_hands::Result<Assignment<'a>> {
    if parallel {
        tracing::warn!("built without the parallel feature, processing tracks sequentially");
    }
    assign_hands(recording, classifier)
}

/// Assign hands and write the tagged file
pub fn split(input: &Path, output: Option<&Path>, config: &HandsConfig, json: bool) -> Result<()> {
    let bytes = read_midi(input)?;
    let recording = Recording::decode(&bytes)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let classifier = build_classifier(config)?;
    let assignment = run_assignment(&recording, classifier.as_ref(), config.engine.parallel)
        .with_context(|| format!("Failed to assign hands in {}", input.display()))?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    let encoded = assignment
        .recording
        .encode()
        .context("Failed to encode tagged MIDI")?;
    std::fs::write(&output, encoded)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if json {
        let report = json!({
            "input": input.display().to_string(),
            "output": output.display().to_string(),
            "format": recording.format(),
            "ppq": recording.ppq(),
            "counts": assignment.counts,
            "retriggers": assignment.retriggers(),
            "unresolved_note_offs": assignment.unresolved_note_offs(),
            "tracks": assignment.tracks,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("right: {}", assignment.counts.right);
        println!("left: {}", assignment.counts.left);
        if assignment.unresolved_note_offs() > 0 {
            println!("unresolved note-offs: {}", assignment.unresolved_note_offs());
        }
        println!("wrote {}", output.display());
    }

    Ok(())
}

fn describe_timing(recording: &Recording<'_>) -> String {
    match (recording.ppq(), recording.header.timing) {
        (Some(ppq), _) => format!("{} ticks per quarter note", ppq),
        (None, Timing::Timecode(fps, subframe)) => {
            format!("timecode {} fps, {} ticks per frame", fps.as_f32(), subframe)
        }
        (None, Timing::Metrical(_)) => "unknown".to_string(),
    }
}

fn describe_format(recording: &Recording<'_>) -> String {
    let layout = match recording.format() {
        0 => "single track",
        1 => "parallel tracks",
        _ => "sequential tracks",
    };
    format!("{} ({})", recording.format(), layout)
}

/// Print a per-track summary of a MIDI file
pub fn inspect(input: &Path) -> Result<()> {
    let bytes = read_midi(input)?;
    let recording = Recording::decode(&bytes)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    println!("file: {}", input.display());
    println!("format: {}", describe_format(&recording));
    println!("timing: {}", describe_timing(&recording));
    println!("tracks: {}", recording.tracks.len());

    for (index, track) in recording.tracks.iter().enumerate() {
        let channels = track
            .channels_used()
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  track {}: {} events, {} note-ons, channels [{}]",
            index,
            track.len(),
            track.sounding_note_count(),
            channels
        );
    }

    println!("note-ons: {}", recording.sounding_note_count());
    Ok(())
}

/// Print the effective configuration and its sources
pub fn show_config(config: &HandsConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# no config files found, using defaults");
    }
    for path in &sources.files {
        println!("# loaded: {}", path.display());
    }
    for var in &sources.env_overrides {
        println!("# env override: {}", var);
    }
    println!();
    print!("{}", config.to_toml());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/music/etude.mid")),
            PathBuf::from("/music/etude_hands.mid")
        );
        assert_eq!(
            default_output_path(Path::new("take2.MIDI")),
            PathBuf::from("take2_hands.mid")
        );
    }

    #[test]
    fn midi_extension_is_case_insensitive() {
        assert!(has_midi_extension(Path::new("a.mid")));
        assert!(has_midi_extension(Path::new("a.MIDI")));
        assert!(!has_midi_extension(Path::new("a.wav")));
        assert!(!has_midi_extension(Path::new("noext")));
    }

    #[test]
    fn classifier_follows_config() {
        let mut config = HandsConfig::default();
        config.classifier.split_point = 64;
        assert!(build_classifier(&config).is_ok());

        config.classifier.model = Some(PathBuf::from("/nonexistent/model.json"));
        assert!(build_classifier(&config).is_err());
    }
}
