//! Decoded Standard MIDI File, split into note events and everything else.
//!
//! Note-on and note-off messages are lifted into [`EventKind::NoteOn`] and
//! [`EventKind::NoteOff`] so their channel can be retagged. Every other event
//! keeps the original `midly` representation and is written back verbatim.

use midly::num::{u28, u4, u7};
use midly::{Format, Header, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

/// A single timed event within a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<'a> {
    /// Ticks since the previous event in the same track.
    pub delta: u32,
    pub kind: EventKind<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind<'a> {
    /// Note-on as encoded in the file. Velocity 0 is a note-off in disguise
    /// and is kept as a note-on so it is written back the same way.
    NoteOn { key: u7, velocity: u7, channel: u8 },
    NoteOff { key: u7, velocity: u7, channel: u8 },
    Other(TrackEventKind<'a>),
}

impl<'a> Event<'a> {
    pub fn note_on(delta: u32, key: u7, velocity: u7) -> Self {
        Self {
            delta,
            kind: EventKind::NoteOn {
                key,
                velocity,
                channel: 0,
            },
        }
    }

    pub fn note_off(delta: u32, key: u7) -> Self {
        Self {
            delta,
            kind: EventKind::NoteOff {
                key,
                velocity: u7::new(0),
                channel: 0,
            },
        }
    }

    pub fn other(delta: u32, kind: TrackEventKind<'a>) -> Self {
        Self {
            delta,
            kind: EventKind::Other(kind),
        }
    }

    /// Same event with its note channel replaced. Non-note events are
    /// returned unchanged.
    pub fn on_channel(mut self, new_channel: u8) -> Self {
        match &mut self.kind {
            EventKind::NoteOn { channel, .. } | EventKind::NoteOff { channel, .. } => {
                *channel = new_channel;
            }
            EventKind::Other(_) => {}
        }
        self
    }

    /// Note channel, or `None` for non-note events.
    pub fn channel(&self) -> Option<u8> {
        match self.kind {
            EventKind::NoteOn { channel, .. } | EventKind::NoteOff { channel, .. } => {
                Some(channel)
            }
            EventKind::Other(_) => None,
        }
    }

    /// A note-on with non-zero velocity.
    pub fn is_sounding(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn { velocity, .. } if velocity.as_int() > 0)
    }

    /// A note-off, or a note-on with zero velocity.
    pub fn is_silencing(&self) -> bool {
        match self.kind {
            EventKind::NoteOff { .. } => true,
            EventKind::NoteOn { velocity, .. } => velocity.as_int() == 0,
            EventKind::Other(_) => false,
        }
    }

    fn from_midly(event: &TrackEvent<'a>) -> Self {
        let delta = event.delta.as_int();
        let kind = match event.kind {
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } => EventKind::NoteOn {
                key,
                velocity: vel,
                channel: channel.as_int(),
            },
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel },
            } => EventKind::NoteOff {
                key,
                velocity: vel,
                channel: channel.as_int(),
            },
            other => EventKind::Other(other),
        };
        Self { delta, kind }
    }

    fn to_midly(self) -> TrackEvent<'a> {
        let kind = match self.kind {
            EventKind::NoteOn {
                key,
                velocity,
                channel,
            } => TrackEventKind::Midi {
                channel: u4::from(channel),
                message: MidiMessage::NoteOn { key, vel: velocity },
            },
            EventKind::NoteOff {
                key,
                velocity,
                channel,
            } => TrackEventKind::Midi {
                channel: u4::from(channel),
                message: MidiMessage::NoteOff { key, vel: velocity },
            },
            EventKind::Other(kind) => kind,
        };
        TrackEvent {
            delta: u28::from(self.delta),
            kind,
        }
    }
}

/// Ordered events of one track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track<'a> {
    pub events: Vec<Event<'a>>,
}

impl<'a> Track<'a> {
    pub fn new(events: Vec<Event<'a>>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of note-ons with non-zero velocity.
    pub fn sounding_note_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_sounding()).count()
    }

    /// Sorted, deduplicated channels of every channel message in the track.
    pub fn channels_used(&self) -> Vec<u8> {
        let mut channels: Vec<u8> = self
            .events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::NoteOn { channel, .. } | EventKind::NoteOff { channel, .. } => {
                    Some(channel)
                }
                EventKind::Other(TrackEventKind::Midi { channel, .. }) => Some(channel.as_int()),
                EventKind::Other(_) => None,
            })
            .collect();
        channels.sort_unstable();
        channels.dedup();
        channels
    }
}

/// A decoded MIDI file: untouched header plus its tracks in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording<'a> {
    pub header: Header,
    pub tracks: Vec<Track<'a>>,
}

impl<'a> Recording<'a> {
    pub fn new(header: Header, tracks: Vec<Track<'a>>) -> Self {
        Self { header, tracks }
    }

    /// Parse Standard MIDI File bytes.
    pub fn decode(bytes: &'a [u8]) -> crate::Result<Self> {
        let smf = Smf::parse(bytes).map_err(|e| crate::Error::MidiParse(e.to_string()))?;
        Ok(Self::from_smf(&smf))
    }

    pub fn from_smf(smf: &Smf<'a>) -> Self {
        let tracks = smf
            .tracks
            .iter()
            .map(|track| Track::new(track.iter().map(Event::from_midly).collect()))
            .collect();

        Self {
            header: smf.header,
            tracks,
        }
    }

    pub fn to_smf(&self) -> Smf<'a> {
        Smf {
            header: self.header,
            tracks: self
                .tracks
                .iter()
                .map(|track| track.events.iter().map(|e| e.to_midly()).collect())
                .collect(),
        }
    }

    /// Serialize back to Standard MIDI File bytes.
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.to_smf()
            .write(&mut buffer)
            .map_err(|e| crate::Error::MidiWrite(e.to_string()))?;
        Ok(buffer)
    }

    /// SMF format number (0, 1 or 2).
    pub fn format(&self) -> u8 {
        match self.header.format {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }

    /// Ticks per quarter note, or `None` for timecode-based files.
    pub fn ppq(&self) -> Option<u16> {
        match self.header.timing {
            Timing::Metrical(ticks) => Some(ticks.as_int()),
            Timing::Timecode(_, _) => None,
        }
    }

    pub fn sounding_note_count(&self) -> usize {
        self.tracks.iter().map(Track::sounding_note_count).sum()
    }
}
