//! Standard MIDI File header and chunk layout.

use std::fmt;

use log::{debug, warn};

use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 14;
const CHUNK_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    SingleTrack,
    Parallel,
    Sequential,
    Unknown(u16),
}

impl From<u16> for Format {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::SingleTrack,
            1 => Self::Parallel,
            2 => Self::Sequential,
            v => Self::Unknown(v),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleTrack => write!(f, "0 (single track)"),
            Self::Parallel => write!(f, "1 (simultaneous tracks)"),
            Self::Sequential => write!(f, "2 (independent tracks)"),
            Self::Unknown(v) => write!(f, "{v} (unknown)"),
        }
    }
}

/// The header's time division word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Division {
    TicksPerQuarter(u16),
    /// Bit 15 set: negative frames per second in the high byte, ticks per frame in the low one.
    Smpte(u16),
}

impl From<u16> for Division {
    fn from(value: u16) -> Self {
        if value & 0x8000 != 0 {
            Self::Smpte(value)
        } else {
            Self::TicksPerQuarter(value)
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TicksPerQuarter(tpqn) => write!(f, "{tpqn} ticks per quarter note"),
            Self::Smpte(raw) => {
                let fps = -i16::from((raw >> 8) as u8 as i8);
                write!(f, "SMPTE {fps} fps, {} ticks per frame", raw & 0xFF)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    pub track_count: u16,
    pub division: Division,
}

/// Byte range of one `MTrk` chunk's payload inside the source buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawTrack {
    pub start: usize,
    pub end: usize,
}

impl RawTrack {
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }
}

fn be_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([buf[pos], buf[pos + 1]])
}

fn be_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

pub fn parse_header(buf: &[u8]) -> Result<Header> {
    if buf.len() < HEADER_LEN {
        return Err(Error::InvalidHeader("file is shorter than the 14-byte header"));
    }
    if &buf[0..4] != b"MThd" {
        return Err(Error::InvalidHeader("missing MThd magic"));
    }
    if be_u32(buf, 4) != 6 {
        return Err(Error::InvalidHeader("header chunk length is not 6"));
    }
    Ok(Header {
        format: be_u16(buf, 8).into(),
        track_count: be_u16(buf, 10),
        division: be_u16(buf, 12).into(),
    })
}

/// Validates the header and locates the payload of every declared track.
pub fn scan(buf: &[u8]) -> Result<(Header, Vec<RawTrack>)> {
    let header = parse_header(buf)?;
    let declared = usize::from(header.track_count);
    let mut tracks = Vec::with_capacity(declared);

    let mut cursor = HEADER_LEN;
    while tracks.len() < declared {
        if buf.len() - cursor < CHUNK_HEADER_LEN {
            if cursor != buf.len() {
                warn!(
                    "Ignoring {} trailing bytes at offset {cursor:#x}",
                    buf.len() - cursor
                );
            }
            break;
        }
        let tag = &buf[cursor..cursor + 4];
        let len = be_u32(buf, cursor + 4) as usize;
        let start = cursor + CHUNK_HEADER_LEN;
        let end = start.saturating_add(len);
        if end > buf.len() {
            warn!(
                "Chunk {:?} at offset {cursor:#x} declares {len} bytes, but only {} remain",
                String::from_utf8_lossy(tag),
                buf.len() - start
            );
            break;
        }
        if tag == b"MTrk" {
            debug!("Track #{}: bytes [{start:#x}, {end:#x}[", tracks.len());
            tracks.push(RawTrack { start, end });
        } else {
            warn!(
                "Skipping unknown chunk {:?} ({len} bytes) at offset {cursor:#x}",
                String::from_utf8_lossy(tag)
            );
        }
        cursor = end;
    }

    if tracks.len() < declared {
        return Err(Error::TrackCountMismatch {
            declared: header.track_count,
            found: tracks.len(),
        });
    }
    Ok((header, tracks))
}
