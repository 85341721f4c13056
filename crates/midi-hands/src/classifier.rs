use crate::features::{NoteFeatures, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Why a classifier could not score a note.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("score {0} is not a finite number")]
    NonFiniteScore(f64),

    #[error("model error: {0}")]
    Model(String),
}

/// Maps a note descriptor onto a hand score.
///
/// Scores below [`crate::LEFT_THRESHOLD`] mean right hand, anything else left
/// hand. Implementations are called once per sounding note-on, in track order.
pub trait HandClassifier {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError>;
}

impl<C: HandClassifier + ?Sized> HandClassifier for &C {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        (**self).score(features)
    }
}

impl<C: HandClassifier + ?Sized> HandClassifier for Box<C> {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        (**self).score(features)
    }
}

/// Adapts an infallible closure into a classifier.
pub struct FnClassifier<F>(pub F);

impl<F> HandClassifier for FnClassifier<F>
where
    F: Fn(&NoteFeatures) -> f64,
{
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        Ok((self.0)(features))
    }
}

/// Keyboard split: everything below `split_point` goes to the left hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPointClassifier {
    pub split_point: u8,
}

impl SplitPointClassifier {
    /// Middle C.
    pub const DEFAULT_SPLIT: u8 = 60;

    pub fn new(split_point: u8) -> Self {
        Self { split_point }
    }
}

impl Default for SplitPointClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPLIT)
    }
}

impl HandClassifier for SplitPointClassifier {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        if features.note() < self.split_point as f64 {
            Ok(1.0)
        } else {
            Ok(0.0)
        }
    }
}

/// Fixed score per pitch, with a fallback for pitches not in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupClassifier {
    pub by_pitch: BTreeMap<u8, f64>,
    pub default_score: f64,
}

impl LookupClassifier {
    pub fn new(default_score: f64) -> Self {
        Self {
            by_pitch: BTreeMap::new(),
            default_score,
        }
    }

    pub fn with_score(mut self, pitch: u8, score: f64) -> Self {
        self.by_pitch.insert(pitch, score);
        self
    }
}

impl HandClassifier for LookupClassifier {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        let note = features.note();
        if !(0.0..=127.0).contains(&note) {
            return Ok(self.default_score);
        }
        Ok(self
            .by_pitch
            .get(&(note as u8))
            .copied()
            .unwrap_or(self.default_score))
    }
}

/// Logistic regression over the raw `[time, note, velocity]` features.
///
/// Model files are JSON: `{"weights": [w_time, w_note, w_velocity], "bias": b}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl LogisticModel {
    pub fn new(weights: [f64; FEATURE_COUNT], bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ClassifierError::Model(e.to_string()))?;

        if model.weights.iter().chain(std::iter::once(&model.bias)).any(|w| !w.is_finite()) {
            return Err(ClassifierError::Model(
                "weights and bias must be finite".to_string(),
            ));
        }

        Ok(model)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| crate::Error::ModelLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let model = Self::from_json(&contents).map_err(|e| crate::Error::ModelLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), ?model, "loaded logistic hand model");
        Ok(model)
    }

    fn logit(&self, features: &NoteFeatures) -> f64 {
        self.weights
            .iter()
            .zip(features.as_array())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

impl HandClassifier for LogisticModel {
    fn score(&self, features: &NoteFeatures) -> Result<f64, ClassifierError> {
        Ok(1.0 / (1.0 + (-self.logit(features)).exp()))
    }
}
