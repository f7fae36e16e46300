//! PC-speaker tone stream encoding.
//!
//! A tone stream is a sequence of little-endian `(duration_ms: u16, divisor: u16)` records,
//! terminated by `(0, 0)`. A divisor of 0 in any other record is a rest.

use std::io;

use log::debug;

use crate::error::{Error, Result};

/// Input clock of the 8253/8254 programmable interval timer.
pub const PIT_CLOCK_HZ: u32 = 1_193_182;

/// Longest duration a single record can hold.
pub const MAX_RECORD_MS: u64 = u16::MAX as u64;

pub const RECORD_LEN: usize = 4;

/// Equal-temperament frequency of a MIDI note, with A4 (note 69) at 440 Hz.
pub fn frequency(note: u8) -> f64 {
    440.0 * 2.0f64.powf((f64::from(note) - 69.0) / 12.0)
}

/// Timer reload value that makes the speaker sound `note`.
///
/// The quotient is truncated and clamped to `1..=65535`, since 0 is reserved for rests.
pub fn divisor(note: u8, clock_hz: u32) -> u16 {
    let divisor = (f64::from(clock_hz) / frequency(note)) as u64;
    divisor.clamp(1, u64::from(u16::MAX)) as u16
}

/// A span at one constant pitch, before millisecond quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneSegment {
    pub micros: u64,
    /// 0 for silence.
    pub divisor: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub duration_ms: u16,
    pub divisor: u16,
}

impl Record {
    pub const TERMINATOR: Self = Self {
        duration_ms: 0,
        divisor: 0,
    };

    pub fn to_le_bytes(self) -> [u8; RECORD_LEN] {
        let [d0, d1] = self.duration_ms.to_le_bytes();
        let [v0, v1] = self.divisor.to_le_bytes();
        [d0, d1, v0, v1]
    }

    pub fn from_le_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self {
            duration_ms: u16::from_le_bytes([bytes[0], bytes[1]]),
            divisor: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.divisor == 0
    }
}

/// The records of a tone stream, without the terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToneStream {
    pub records: Vec<Record>,
}

fn push_coalesced(spans: &mut Vec<(u64, u16)>, len: u64, divisor: u16) {
    match spans.last_mut() {
        Some((last_len, last_divisor)) if *last_divisor == divisor => {
            *last_len = last_len.saturating_add(len);
        }
        _ => spans.push((len, divisor)),
    }
}

impl ToneStream {
    /// Quantizes segments to whole milliseconds and packs them into records.
    ///
    /// Equal-divisor neighbours are merged both before and after dropping sub-millisecond
    /// segments, so no two consecutive records share a divisor.
    pub fn encode(segments: &[ToneSegment]) -> Self {
        let mut coalesced = Vec::with_capacity(segments.len());
        for seg in segments {
            push_coalesced(&mut coalesced, seg.micros, seg.divisor);
        }

        let mut spans = Vec::with_capacity(coalesced.len());
        for (micros, divisor) in coalesced {
            let ms = micros / 1000;
            if ms == 0 {
                debug!("Dropping {micros} µs segment at divisor {divisor}");
                continue;
            }
            push_coalesced(&mut spans, ms, divisor);
        }

        let mut records = Vec::with_capacity(spans.len());
        for (mut ms, divisor) in spans {
            while ms > MAX_RECORD_MS {
                records.push(Record {
                    duration_ms: u16::MAX,
                    divisor,
                });
                ms -= MAX_RECORD_MS;
            }
            records.push(Record {
                duration_ms: ms as u16,
                divisor,
            });
        }
        Self { records }
    }

    /// Reads records up to the terminator. Anything after it is ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut records = Vec::new();
        let mut chunks = bytes.chunks_exact(RECORD_LEN);
        for chunk in chunks.by_ref() {
            let mut raw = [0; RECORD_LEN];
            raw.copy_from_slice(chunk);
            let record = Record::from_le_bytes(raw);
            if record == Record::TERMINATOR {
                let consumed = (records.len() + 1) * RECORD_LEN;
                if consumed < bytes.len() {
                    debug!("Ignoring {} bytes after the terminator", bytes.len() - consumed);
                }
                return Ok(Self { records });
            }
            records.push(record);
        }
        Err(Error::TruncatedStream {
            offset: records.len() * RECORD_LEN,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_ms(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration_ms))
            .sum()
    }

    pub fn write_to<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        for record in self.records.iter().chain([&Record::TERMINATOR]) {
            out.write_all(&record.to_le_bytes())?;
        }
        out.flush()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.records.len() + 1) * RECORD_LEN);
        for record in self.records.iter().chain([&Record::TERMINATOR]) {
            out.extend_from_slice(&record.to_le_bytes());
        }
        out
    }
}
