//! Sounding-note and tempo tracking, reducing a timeline to one pitch at a time.

use log::{debug, trace};

use crate::{
    event::{self, Event, EventKind},
    time::Clock,
    tone::{self, ToneSegment},
};

/// Running state of one reduction pass.
#[derive(Clone, Debug, PartialEq)]
pub struct MonoState {
    clock: Clock,
    /// Bit `c` of entry `n` is set while note `n` sounds on channel `c`.
    notes: [u16; 128],
    tick: u64,
    /// Only notes from this track are heard, if set.
    note_track: Option<usize>,
}

impl MonoState {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            notes: [0; 128],
            tick: 0,
            note_track: None,
        }
    }

    pub fn with_note_track(mut self, track: Option<usize>) -> Self {
        self.note_track = track;
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tempo(&self) -> u32 {
        self.clock.tempo()
    }

    pub fn highest_note(&self) -> Option<u8> {
        self.notes.iter().rposition(|&ch| ch != 0).map(|n| n as u8)
    }

    /// Moves to `tick`, returning the length of the elapsed span and the note heard during it.
    pub fn advance_to(&mut self, tick: u64) -> Option<(u64, Option<u8>)> {
        if tick <= self.tick {
            return None;
        }
        let micros = self.clock.micros(tick - self.tick);
        self.tick = tick;
        Some((micros, self.highest_note()))
    }

    pub fn update(&mut self, ev: &Event) {
        if let EventKind::SetTempo { micros_per_quarter } = ev.kind {
            self.clock.set_tempo(micros_per_quarter);
            return;
        }
        if self.note_track.is_some_and(|track| track != ev.track) {
            return;
        }
        if let Some(note) = event::note(ev) {
            // Data bytes are 7-bit.
            let key = usize::from(note.key & 0x7F);
            if note.is_on() {
                self.notes[key] |= 1 << (note.channel & 0x0F);
            } else {
                // Releases the key on every channel.
                self.notes[key] = 0;
            }
        }
    }
}

/// Walks a merged timeline and emits one segment per span between events with differing ticks.
pub fn reduce(mut state: MonoState, timeline: &[Event], clock_hz: u32) -> Vec<ToneSegment> {
    let mut segments = Vec::new();
    for ev in timeline {
        let start = state.tick();
        if let Some((micros, note)) = state.advance_to(ev.tick) {
            let divisor = note.map_or(0, |n| tone::divisor(n, clock_hz));
            trace!(
                "[{start}, {}[: {micros} µs, note {note:?}, divisor {divisor}",
                ev.tick
            );
            segments.push(ToneSegment { micros, divisor });
        }
        state.update(ev);
    }
    debug!(
        "Reduced {} events to {} segments, ending at tick {} with {} µs/qn",
        timeline.len(),
        segments.len(),
        state.tick(),
        state.tempo()
    );
    segments
}
