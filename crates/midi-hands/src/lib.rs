//! Left/right hand assignment for MIDI performance recordings.
//!
//! A [`Recording`] is decoded from Standard MIDI File bytes, every sounding
//! note-on is scored by a [`HandClassifier`], and note events are retagged to
//! channel 0 (right hand) or channel 1 (left hand). Note-offs carry no hand
//! of their own, so they follow whichever hand currently holds their pitch.
//!
//! ```no_run
//! use midi_hands::{assign_hands, Recording, SplitPointClassifier};
//!
//! let bytes = std::fs::read("performance.mid").unwrap();
//! let recording = Recording::decode(&bytes).unwrap();
//! let assignment = assign_hands(&recording, &SplitPointClassifier::default()).unwrap();
//! println!("right: {}, left: {}", assignment.counts.right, assignment.counts.left);
//! let out = assignment.recording.encode().unwrap();
//! ```

pub mod assign;
pub mod classifier;
pub mod features;
pub mod hand;
pub mod recording;

pub use assign::{assign_hands, assign_track, Assignment, HandCounts, TrackAssigner, TrackReport};
#[cfg(feature = "parallel")]
pub use assign::assign_hands_parallel;
pub use classifier::{
    ClassifierError, FnClassifier, HandClassifier, LogisticModel, LookupClassifier,
    SplitPointClassifier,
};
pub use features::{extract_features, NoteFeatures, FEATURE_COUNT};
pub use hand::{ActiveNotes, Hand, LEFT_THRESHOLD};
pub use recording::{Event, EventKind, Recording, Track};

use std::path::PathBuf;

/// Errors from hand assignment and MIDI I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("MIDI write error: {0}")]
    MidiWrite(String),

    #[error("classifier failed on track {track}, event {event_index} (pitch {key}): {source}")]
    Classifier {
        track: usize,
        event_index: usize,
        key: u8,
        source: ClassifierError,
    },

    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
