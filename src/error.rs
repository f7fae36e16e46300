//! Conversion errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can stop a conversion.
///
/// Offsets are absolute byte positions in the input file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid MIDI header: {0}")]
    InvalidHeader(&'static str),

    #[error("header declares {declared} tracks, but only {found} MTrk chunks were found")]
    TrackCountMismatch { declared: u16, found: usize },

    #[error("variable-length quantity at offset {offset:#x} is longer than 4 bytes")]
    MalformedVarint { offset: usize },

    #[error("variable-length quantity at offset {offset:#x} runs past the end of its data")]
    TruncatedVarint { offset: usize },

    #[error("track #{track}: unexpected byte {byte:#04x} at offset {offset:#x} without a usable status")]
    UnknownStatusByte {
        track: usize,
        offset: usize,
        byte: u8,
    },

    #[error("track #{track}: event at offset {offset:#x} runs past the end of the track")]
    TruncatedEvent { track: usize, offset: usize },

    #[error("track #{track}: {source}")]
    InTrack {
        track: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("SMPTE time division {0:#06x} is not supported")]
    UnsupportedTimeDivision(u16),

    #[error("track #{requested} does not exist (the sequence has {count} tracks)")]
    NoSuchTrack { requested: usize, count: usize },

    #[error("tone stream is truncated at offset {offset:#x} (no terminating record)")]
    TruncatedStream { offset: usize },

    #[error("{} is already the output of {}", .path.display(), .first_input.display())]
    DuplicateOutput { path: PathBuf, first_input: PathBuf },

    #[error("{}: {source}", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::IoFailure { path, source }
    }

    /// Attaches a track index to errors that don't already carry one.
    pub(crate) fn in_track(self, track: usize) -> Self {
        match self {
            Self::MalformedVarint { .. } | Self::TruncatedVarint { .. } => Self::InTrack {
                track,
                source: Box::new(self),
            },
            other => other,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
