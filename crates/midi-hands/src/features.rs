use serde::{Deserialize, Serialize};

/// Number of features a classifier receives per note.
pub const FEATURE_COUNT: usize = 3;

/// Descriptor of a single sounding note, in classifier input order:
/// `[time, note, velocity]`.
///
/// `time` is the event's delta in ticks, so simultaneous chord tones after
/// the first usually carry 0. Values are passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteFeatures(pub [f64; FEATURE_COUNT]);

impl NoteFeatures {
    pub fn time(&self) -> f64 {
        self.0[0]
    }

    pub fn note(&self) -> f64 {
        self.0[1]
    }

    pub fn velocity(&self) -> f64 {
        self.0[2]
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Build the classifier input for a note-on event.
pub fn extract_features(delta: u32, key: u8, velocity: u8) -> NoteFeatures {
    NoteFeatures([delta as f64, key as f64, velocity as f64])
}
