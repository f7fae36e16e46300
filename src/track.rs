//! Track chunk decoding, including running status.

use log::{trace, warn};

use crate::{
    error::{Error, Result},
    event::{Event, EventKind},
    smf::RawTrack,
    varint,
};

const META: u8 = 0xFF;
const META_END_OF_TRACK: u8 = 0x2F;
const META_SET_TEMPO: u8 = 0x51;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    AwaitingDelta,
    AwaitingStatus,
    /// `offset` is where the event's status (or first data byte) starts.
    AwaitingData { status: u8, offset: usize },
}

/// Decodes the events of one track, borrowing the source buffer.
pub struct TrackDecoder<'a> {
    buf: &'a [u8],
    index: usize,
    cursor: usize,
    tick: u64,
    /// Last channel status byte, 0 if none was seen yet.
    running_status: u8,
    state: State,
    finished: bool,
}

impl<'a> TrackDecoder<'a> {
    pub fn new(buf: &'a [u8], raw: RawTrack, index: usize) -> Self {
        Self {
            buf: &buf[..raw.end],
            index,
            cursor: raw.start,
            tick: 0,
            running_status: 0,
            state: State::AwaitingDelta,
            finished: false,
        }
    }

    fn take(&mut self, n: usize, offset: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.cursor < n {
            return Err(Error::TruncatedEvent {
                track: self.index,
                offset,
            });
        }
        let buf = self.buf;
        let bytes = &buf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(bytes)
    }

    fn varint(&mut self) -> Result<u32> {
        let (value, next) =
            varint::read(self.buf, self.cursor).map_err(|e| e.in_track(self.index))?;
        self.cursor = next;
        Ok(value)
    }

    fn message(&mut self, status: u8, offset: usize) -> Result<EventKind> {
        let channel = status & 0x0F;
        let kind = match status & 0xF0 {
            0x80 => {
                let data = self.take(2, offset)?;
                EventKind::NoteOff {
                    channel,
                    note: data[0],
                    velocity: data[1],
                }
            }
            0x90 => {
                let data = self.take(2, offset)?;
                EventKind::NoteOn {
                    channel,
                    note: data[0],
                    velocity: data[1],
                }
            }
            0xA0 | 0xB0 | 0xE0 => {
                self.take(2, offset)?;
                EventKind::Other { status }
            }
            0xC0 | 0xD0 => {
                self.take(1, offset)?;
                EventKind::Other { status }
            }
            _ => match status {
                META => {
                    let meta_type = self.take(1, offset)?[0];
                    let len = self.varint()? as usize;
                    let payload = self.take(len, offset)?;
                    match meta_type {
                        META_SET_TEMPO if payload.len() >= 3 => EventKind::SetTempo {
                            micros_per_quarter: u32::from(payload[0]) << 16
                                | u32::from(payload[1]) << 8
                                | u32::from(payload[2]),
                        },
                        META_END_OF_TRACK => EventKind::EndOfTrack,
                        _ => EventKind::Other { status },
                    }
                }
                0xF0 | 0xF7 => {
                    let len = self.varint()? as usize;
                    self.take(len, offset)?;
                    EventKind::Other { status }
                }
                byte => {
                    return Err(Error::UnknownStatusByte {
                        track: self.index,
                        offset,
                        byte,
                    })
                }
            },
        };
        Ok(kind)
    }

    /// Runs the state machine up to the next event. `None` once the track's bytes are used up.
    fn step(&mut self) -> Result<Option<Event>> {
        loop {
            match self.state {
                State::AwaitingDelta | State::AwaitingStatus if self.cursor >= self.buf.len() => {
                    warn!(
                        "Track #{}: no end-of-track event before offset {:#x}",
                        self.index, self.cursor
                    );
                    return Ok(None);
                }
                State::AwaitingDelta => {
                    let delta = self.varint()?;
                    self.tick += u64::from(delta);
                    self.state = State::AwaitingStatus;
                }
                State::AwaitingStatus => {
                    let offset = self.cursor;
                    let byte = self.buf[offset];
                    let status = if byte & 0x80 != 0 {
                        self.cursor += 1;
                        // Meta and sysex events cancel running status.
                        self.running_status = if byte < 0xF0 { byte } else { 0 };
                        byte
                    } else if self.running_status != 0 {
                        self.running_status
                    } else {
                        return Err(Error::UnknownStatusByte {
                            track: self.index,
                            offset,
                            byte,
                        });
                    };
                    self.state = State::AwaitingData { status, offset };
                }
                State::AwaitingData { status, offset } => {
                    let kind = self.message(status, offset)?;
                    self.state = State::AwaitingDelta;
                    if kind == EventKind::EndOfTrack {
                        self.finished = true;
                    }
                    let ev = Event {
                        tick: self.tick,
                        track: self.index,
                        kind,
                    };
                    trace!("Track #{}: {offset:#x} @{}: {}", self.index, ev.tick, kind);
                    return Ok(Some(ev));
                }
            }
        }
    }
}

impl Iterator for TrackDecoder<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(ev)) => Some(Ok(ev)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Decodes a whole track, failing on the first malformed event.
pub fn decode(buf: &[u8], raw: RawTrack, index: usize) -> Result<Vec<Event>> {
    TrackDecoder::new(buf, raw, index).collect()
}

/// Decodes a track up to its first malformed event, returning that error alongside.
pub fn decode_lenient(buf: &[u8], raw: RawTrack, index: usize) -> (Vec<Event>, Option<Error>) {
    let mut events = Vec::new();
    for ev in TrackDecoder::new(buf, raw, index) {
        match ev {
            Ok(ev) => events.push(ev),
            Err(e) => return (events, Some(e)),
        }
    }
    (events, None)
}
