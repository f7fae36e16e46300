//! Timekeeping in ticks, beats, and microseconds.

use std::cmp::max;

use log::warn;

use crate::{
    error::Error,
    event::{Event, EventKind},
    smf::Division,
};

/// 120 BPM, in effect until the first tempo event.
pub const DEFAULT_TEMPO: u32 = 500_000;
pub const FALLBACK_TICKS_PER_QUARTER: u16 = 480;

pub fn ticks_to_micros(delta_ticks: u64, micros_per_quarter: u32, ticks_per_quarter: u16) -> u64 {
    let micros =
        u128::from(delta_ticks) * u128::from(micros_per_quarter) / u128::from(ticks_per_quarter);
    u64::try_from(micros).unwrap_or(u64::MAX)
}

/// Converts tick spans into microseconds at the current tempo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    ticks_per_quarter: u16,
    micros_per_quarter: u32,
}

impl Clock {
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self {
            ticks_per_quarter: max(ticks_per_quarter, 1),
            micros_per_quarter: DEFAULT_TEMPO,
        }
    }

    /// Falls back to `fallback` ticks per quarter note for divisions that can't be used for
    /// metrical timing, returning the reason.
    pub fn for_division(division: Division, fallback: u16) -> (Self, Option<Error>) {
        match division {
            Division::TicksPerQuarter(tpqn) if tpqn > 0 => (Self::new(tpqn), None),
            Division::TicksPerQuarter(_) => {
                warn!("Division is 0 ticks per quarter note, assuming {fallback}");
                (Self::new(fallback), None)
            }
            Division::Smpte(raw) => {
                let err = Error::UnsupportedTimeDivision(raw);
                warn!("{err}, assuming {fallback} ticks per quarter note at 120 BPM");
                (Self::new(fallback), Some(err))
            }
        }
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn tempo(&self) -> u32 {
        self.micros_per_quarter
    }

    pub fn set_tempo(&mut self, micros_per_quarter: u32) {
        self.micros_per_quarter = micros_per_quarter;
    }

    pub fn micros(&self, delta_ticks: u64) -> u64 {
        ticks_to_micros(delta_ticks, self.micros_per_quarter, self.ticks_per_quarter)
    }
}

#[derive(Clone)]
pub struct UnitWidths {
    pub tick: usize,
    pub beat: usize,
    pub track: usize,
}

fn digits(value: u64) -> usize {
    (max(value, 1).ilog10() + 1) as usize
}

/// Renders ticks as totals and as 0-based *quarter-note:tick* beat numbers.
pub struct MidiTimeDisplay {
    ticks_per_quarter: u64,
    widths: UnitWidths,
}

impl MidiTimeDisplay {
    fn with_limits(ticks_per_quarter: u16, tick_max: u64, track_max: usize) -> Self {
        let tpq = u64::from(max(ticks_per_quarter, 1));
        MidiTimeDisplay {
            ticks_per_quarter: tpq,
            widths: UnitWidths {
                tick: digits(tick_max),
                beat: digits(tick_max / tpq) + 1 + digits(tpq - 1),
                track: digits(track_max as u64) + 1,
            },
        }
    }

    pub fn new(clock: &Clock, timeline: &[Event]) -> Self {
        let tick_max = timeline.last().map_or(0, |ev| ev.tick);
        let track_max = timeline.iter().fold(0, |acc, ev| max(acc, ev.track));
        Self::with_limits(clock.ticks_per_quarter(), tick_max, track_max)
    }

    pub fn widths(&self) -> UnitWidths {
        self.widths.clone()
    }

    pub fn beat(&self, tick: u64) -> String {
        let width = digits(self.ticks_per_quarter - 1);
        format!(
            "{}:{:0width$}",
            tick / self.ticks_per_quarter,
            tick % self.ticks_per_quarter
        )
    }
}

/// Sums the wall-clock length of a merged timeline, following its tempo changes.
pub fn timeline_micros(mut clock: Clock, timeline: &[Event]) -> u64 {
    let mut tick = 0;
    let mut total: u64 = 0;
    for ev in timeline {
        total = total.saturating_add(clock.micros(ev.tick - tick));
        tick = ev.tick;
        if let EventKind::SetTempo { micros_per_quarter } = ev.kind {
            clock.set_tempo(micros_per_quarter);
        }
    }
    total
}
