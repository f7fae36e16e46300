//! Decoded track events.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    SetTempo { micros_per_quarter: u32 },
    EndOfTrack,
    /// Anything that doesn't affect the tone stream, with its status byte.
    Other { status: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Track-local before merging, global afterwards.
    pub tick: u64,
    pub track: usize,
    pub kind: EventKind,
}

pub struct Note {
    pub channel: u8,
    pub key: u8,
    pub vel: u8,
}

impl Note {
    pub fn is_on(&self) -> bool {
        self.vel > 0
    }
}

/// Returns the note of note-on and note-off events, with note-offs reported at velocity 0.
pub fn note(ev: &Event) -> Option<Note> {
    match ev.kind {
        EventKind::NoteOn {
            channel,
            note,
            velocity,
        } => Some(Note {
            channel,
            key: note,
            vel: velocity,
        }),
        EventKind::NoteOff { channel, note, .. } => Some(Note {
            channel,
            key: note,
            vel: 0,
        }),
        _ => None,
    }
}

pub fn note_on(ev: &Event) -> Option<Note> {
    note(ev).filter(|n| n.is_on())
}

pub fn bpm(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / f64::from(micros_per_quarter.max(1))
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOn(ch {channel}, key {note}, vel {velocity})"),
            Self::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOff(ch {channel}, key {note}, vel {velocity})"),
            Self::SetTempo { micros_per_quarter } => write!(
                f,
                "SetTempo({micros_per_quarter} µs/qn = {:.2} BPM)",
                bpm(micros_per_quarter)
            ),
            Self::EndOfTrack => write!(f, "EndOfTrack"),
            Self::Other { status } => write!(f, "Other({status:02X})"),
        }
    }
}
