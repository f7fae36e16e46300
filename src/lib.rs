//! Conversion of Standard MIDI Files into monophonic PC-speaker tone streams.
//!
//! The pipeline runs strictly forward: the file is split into track chunks, each track is decoded
//! into timed events, the tracks are merged into one timeline, the timeline is reduced to one
//! pitch per span, and the spans are packed into fixed-size records.

pub mod batch;
pub mod error;
pub mod event;
pub mod smf;
pub mod state;
pub mod time;
pub mod timeline;
pub mod tone;
pub mod track;
pub mod varint;

use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use tempfile::NamedTempFile;

pub use error::{Error, Result};
use event::Event;
use smf::Header;
use state::MonoState;
use time::Clock;
use tone::ToneStream;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Keep the events decoded before an error in a track instead of failing the conversion.
    pub best_effort: bool,
    /// Only take notes from this track. Tempo changes still come from all tracks.
    pub track: Option<usize>,
    pub clock_hz: u32,
    /// Ticks per quarter note to assume if the header's division can't be used.
    pub fallback_division: u16,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            best_effort: false,
            track: None,
            clock_hz: tone::PIT_CLOCK_HZ,
            fallback_division: time::FALLBACK_TICKS_PER_QUARTER,
        }
    }
}

/// A decoded and merged MIDI file.
#[derive(Debug)]
pub struct Sequence {
    pub header: Header,
    pub clock: Clock,
    pub timeline: Vec<Event>,
    /// Recoverable problems, already logged.
    pub warnings: Vec<Error>,
}

/// Decodes every track of `buf` and merges them into one timeline.
pub fn decode(buf: &[u8], opts: &Options) -> Result<Sequence> {
    let (header, raw_tracks) = smf::scan(buf)?;
    debug!(
        "Format {}, {} tracks, {}",
        header.format, header.track_count, header.division
    );
    if let Some(requested) = opts.track {
        if requested >= raw_tracks.len() {
            return Err(Error::NoSuchTrack {
                requested,
                count: raw_tracks.len(),
            });
        }
    }

    let mut warnings = Vec::new();
    let (clock, division_warning) = Clock::for_division(header.division, opts.fallback_division);
    warnings.extend(division_warning);

    let mut tracks = Vec::with_capacity(raw_tracks.len());
    for (track_i, raw) in raw_tracks.into_iter().enumerate() {
        let events = if opts.best_effort {
            let (events, err) = track::decode_lenient(buf, raw, track_i);
            if let Some(err) = err {
                warn!("{err}; keeping the {} events before it", events.len());
                warnings.push(err);
            }
            events
        } else {
            track::decode(buf, raw, track_i)?
        };
        debug!(
            "Track #{track_i}: {} events in {} bytes",
            events.len(),
            raw.len()
        );
        tracks.push(events);
    }

    let timeline = timeline::merge(tracks);
    if let Some(first) = timeline
        .iter()
        .find(|ev| event::note_on(ev).is_some() && opts.track.map_or(true, |t| t == ev.track))
    {
        debug!("First note at tick {} in track #{}", first.tick, first.track);
    }
    Ok(Sequence {
        header,
        clock,
        timeline,
        warnings,
    })
}

#[derive(Debug)]
pub struct Conversion {
    pub header: Header,
    pub ticks_per_quarter: u16,
    /// Spans produced before coalescing and quantization.
    pub segments: usize,
    pub stream: ToneStream,
    pub warnings: Vec<Error>,
}

/// Converts an in-memory MIDI file.
pub fn convert(buf: &[u8], opts: &Options) -> Result<Conversion> {
    let sequence = decode(buf, opts)?;
    let state = MonoState::new(sequence.clock).with_note_track(opts.track);
    let segments = state::reduce(state, &sequence.timeline, opts.clock_hz);
    let stream = ToneStream::encode(&segments);
    info!(
        "{} events -> {} segments -> {} records, {} ms",
        sequence.timeline.len(),
        segments.len(),
        stream.len(),
        stream.total_ms()
    );
    Ok(Conversion {
        header: sequence.header,
        ticks_per_quarter: sequence.clock.ticks_per_quarter(),
        segments: segments.len(),
        stream,
        warnings: sequence.warnings,
    })
}

/// Writes `stream` to `path` through a temporary file in the same directory, so `path` is either
/// fully written or untouched.
pub fn write_stream(path: &Path, stream: &ToneStream) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(Error::io(dir))?;
    stream
        .write_to(BufWriter::new(tmp.as_file_mut()))
        .map_err(Error::io(tmp.path()))?;
    tmp.persist(path).map_err(|e| Error::IoFailure {
        path: PathBuf::from(path),
        source: e.error,
    })?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(Error::io(path))
}

/// Converts `input` and writes the tone stream to `output`. Nothing is written on failure.
pub fn convert_file(input: &Path, output: &Path, opts: &Options) -> Result<Conversion> {
    let bytes = read_file(input)?;
    let conversion = convert(&bytes, opts)?;
    write_stream(output, &conversion.stream)?;
    Ok(conversion)
}

pub fn read_stream(path: &Path) -> Result<ToneStream> {
    ToneStream::parse(&read_file(path)?)
}
