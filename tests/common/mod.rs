#![allow(dead_code)]

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

pub fn note_on(delta: u32, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: 100.into(),
            },
        },
    }
}

pub fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: 0.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 64.into(),
            },
        },
    }
}

pub fn tempo(delta: u32, micros_per_quarter: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(micros_per_quarter.into())),
    }
}

pub fn end(delta: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

/// Writes a metrical SMF with midly.
pub fn smf(ticks_per_quarter: u16, tracks: Vec<Track<'static>>) -> Vec<u8> {
    let format = if tracks.len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let smf = Smf {
        header: Header::new(format, Timing::Metrical(ticks_per_quarter.into())),
        tracks,
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

/// Assembles an SMF from raw track payloads, declaring as many tracks as given.
pub fn raw_smf(division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut out = b"MThd\0\0\0\x06".to_vec();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(track);
    }
    out
}

/// Middle C for one quarter note, then end of track.
pub const MIDDLE_C_QUARTER: &[u8] = &[
    0x00, 0x90, 0x3C, 0x64, //
    0x83, 0x60, 0x80, 0x3C, 0x00, //
    0x00, 0xFF, 0x2F, 0x00,
];
