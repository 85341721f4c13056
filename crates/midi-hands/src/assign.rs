//! The hand-assignment pass.
//!
//! Each track is walked in order with its own [`ActiveNotes`]. Sounding
//! note-ons are classified and claim their pitch for a hand; note-offs take
//! the channel of whichever hand holds their pitch, or stay untouched when no
//! hand does.

use crate::classifier::{ClassifierError, HandClassifier};
use crate::features::extract_features;
use crate::hand::{ActiveNotes, Hand};
use crate::recording::{Event, EventKind, Recording, Track};
use crate::{Error, Result};
use midly::num::u7;
use serde::{Deserialize, Serialize};

/// Sounding note-ons assigned to each hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandCounts {
    pub right: usize,
    pub left: usize,
}

impl HandCounts {
    fn record(&mut self, hand: Hand) {
        match hand {
            Hand::Right => self.right += 1,
            Hand::Left => self.left += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.right + self.left
    }
}

impl std::ops::Add for HandCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            right: self.right + rhs.right,
            left: self.left + rhs.left,
        }
    }
}

/// Diagnostics for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackReport {
    pub track_index: usize,
    pub counts: HandCounts,
    /// Note-ons for a pitch that was still sounding on some hand.
    pub retriggers: usize,
    /// Note-offs whose pitch no hand was holding; their channel is unchanged.
    pub unresolved_note_offs: usize,
}

/// Result of a full pass: the retagged recording plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    pub recording: Recording<'a>,
    pub counts: HandCounts,
    pub tracks: Vec<TrackReport>,
}

impl<'a> Assignment<'a> {
    fn from_tracks(recording: &Recording<'a>, results: Vec<(Track<'a>, TrackReport)>) -> Self {
        let (tracks, reports): (Vec<_>, Vec<_>) = results.into_iter().unzip();
        let counts = reports
            .iter()
            .fold(HandCounts::default(), |acc, r| acc + r.counts);

        Self {
            recording: Recording::new(recording.header, tracks),
            counts,
            tracks: reports,
        }
    }

    pub fn retriggers(&self) -> usize {
        self.tracks.iter().map(|t| t.retriggers).sum()
    }

    pub fn unresolved_note_offs(&self) -> usize {
        self.tracks.iter().map(|t| t.unresolved_note_offs).sum()
    }
}

/// Stateful walker over a single track.
///
/// Feed events with [`TrackAssigner::step`] in track order; each call returns
/// the event with its channel tagged.
pub struct TrackAssigner<'c, C: ?Sized> {
    classifier: &'c C,
    active: ActiveNotes,
    report: TrackReport,
    next_index: usize,
}

impl<'c, C: HandClassifier + ?Sized> TrackAssigner<'c, C> {
    pub fn new(track_index: usize, classifier: &'c C) -> Self {
        Self {
            classifier,
            active: ActiveNotes::new(),
            report: TrackReport {
                track_index,
                ..Default::default()
            },
            next_index: 0,
        }
    }

    pub fn active(&self) -> &ActiveNotes {
        &self.active
    }

    pub fn report(&self) -> &TrackReport {
        &self.report
    }

    pub fn step<'a>(&mut self, event: &Event<'a>) -> Result<Event<'a>> {
        let event_index = self.next_index;
        self.next_index += 1;

        let tagged = match event.kind {
            EventKind::NoteOn { key, velocity, .. } if event.is_sounding() => {
                let hand = self.classify(event_index, event.delta, key, velocity)?;

                if let Some(previous) = self.active.claim(key, hand) {
                    self.report.retriggers += 1;
                    tracing::debug!(
                        track = self.report.track_index,
                        event_index,
                        key = key.as_int(),
                        %previous,
                        %hand,
                        "note retriggered while still sounding"
                    );
                }

                self.report.counts.record(hand);
                event.on_channel(hand.channel())
            }
            EventKind::NoteOn { key, .. } | EventKind::NoteOff { key, .. }
                if event.is_silencing() =>
            {
                match self.active.release(key) {
                    Some(hand) => event.on_channel(hand.channel()),
                    None => {
                        self.report.unresolved_note_offs += 1;
                        tracing::trace!(
                            track = self.report.track_index,
                            event_index,
                            key = key.as_int(),
                            "note-off without a sounding note"
                        );
                        *event
                    }
                }
            }
            _ => *event,
        };

        debug_assert!(self.active.is_disjoint());
        Ok(tagged)
    }

    fn classify(&self, event_index: usize, delta: u32, key: u7, velocity: u7) -> Result<Hand> {
        let key = key.as_int();
        let features = extract_features(delta, key, velocity.as_int());

        let score = self
            .classifier
            .score(&features)
            .and_then(|score| {
                if score.is_finite() {
                    Ok(score)
                } else {
                    Err(ClassifierError::NonFiniteScore(score))
                }
            })
            .map_err(|source| Error::Classifier {
                track: self.report.track_index,
                event_index,
                key,
                source,
            })?;

        tracing::trace!(event_index, key, score, "classified note");
        Ok(Hand::from_score(score))
    }

    pub fn finish(self) -> TrackReport {
        self.report
    }
}

/// Retag one track. `track_index` only feeds diagnostics and errors.
pub fn assign_track<'a, C>(
    track_index: usize,
    track: &Track<'a>,
    classifier: &C,
) -> Result<(Track<'a>, TrackReport)>
where
    C: HandClassifier + ?Sized,
{
    let mut assigner = TrackAssigner::new(track_index, classifier);
    let events = track
        .events
        .iter()
        .map(|event| assigner.step(event))
        .collect::<Result<Vec<_>>>()?;
    let report = assigner.finish();

    tracing::debug!(
        track = track_index,
        events = events.len(),
        right = report.counts.right,
        left = report.counts.left,
        retriggers = report.retriggers,
        unresolved_note_offs = report.unresolved_note_offs,
        "track assigned"
    );

    Ok((Track::new(events), report))
}

/// Assign every note in `recording` to a hand.
///
/// Returns a new recording with identical header, track order, and event
/// order; only note channels differ. A classifier failure anywhere aborts the
/// whole pass.
pub fn assign_hands<'a, C>(recording: &Recording<'a>, classifier: &C) -> Result<Assignment<'a>>
where
    C: HandClassifier + ?Sized,
{
    let results = recording
        .tracks
        .iter()
        .enumerate()
        .map(|(track_index, track)| assign_track(track_index, track, classifier))
        .collect::<Result<Vec<_>>>()?;

    let assignment = Assignment::from_tracks(recording, results);
    log_totals(&assignment);
    Ok(assignment)
}

/// Like [`assign_hands`], with tracks processed concurrently.
///
/// Output is identical to the sequential pass.
#[cfg(feature = "parallel")]
pub fn assign_hands_parallel<'a, C>(
    recording: &Recording<'a>,
    classifier: &C,
) -> Result<Assignment<'a>>
where
    C: HandClassifier + Sync + ?Sized,
{
    use rayon::prelude::*;

    let results = recording
        .tracks
        .par_iter()
        .enumerate()
        .map(|(track_index, track)| assign_track(track_index, track, classifier))
        .collect::<Result<Vec<_>>>()?;

    let assignment = Assignment::from_tracks(recording, results);
    log_totals(&assignment);
    Ok(assignment)
}

fn log_totals(assignment: &Assignment<'_>) {
    tracing::info!(
        tracks = assignment.tracks.len(),
        right = assignment.counts.right,
        left = assignment.counts.left,
        retriggers = assignment.retriggers(),
        unresolved_note_offs = assignment.unresolved_note_offs(),
        "hand assignment complete"
    );
}
