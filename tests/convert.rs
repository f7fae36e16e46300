mod common;

use common::*;
use midtone::{
    convert,
    tone::{divisor, Record, PIT_CLOCK_HZ},
    Error, Options,
};
use pretty_assertions::assert_eq;

fn rec(duration_ms: u16, divisor: u16) -> Record {
    Record {
        duration_ms,
        divisor,
    }
}

fn records(bytes: &[u8], opts: &Options) -> Vec<Record> {
    convert(bytes, opts).unwrap().stream.records
}

#[test]
fn single_quarter_note() {
    let bytes = smf(480, vec![vec![note_on(0, 60), note_off(480, 60), end(0)]]);
    let conversion = convert(&bytes, &Options::default()).unwrap();
    assert_eq!(conversion.stream.records, vec![rec(500, 4560)]);
    assert_eq!(
        conversion.stream.to_bytes(),
        vec![0xF4, 0x01, 0xD0, 0x11, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(conversion.header.track_count, 1);
    assert!(conversion.warnings.is_empty());
}

#[test]
fn tempo_from_another_track_applies_from_its_tick() {
    let conductor = vec![tempo(480, 600_000), end(0)];
    let melody = vec![note_on(0, 60), note_off(960, 60), end(0)];
    let conversion = convert(&smf(480, vec![conductor, melody]), &Options::default()).unwrap();
    assert_eq!(conversion.segments, 2);
    assert_eq!(conversion.stream.records, vec![rec(1100, 4560)]);
}

#[test]
fn highest_note_across_tracks() {
    let low = vec![note_on(0, 60), note_off(960, 60), end(0)];
    let high = vec![note_on(240, 67), note_off(480, 67), end(0)];
    assert_eq!(
        records(&smf(480, vec![low, high]), &Options::default()),
        vec![rec(250, 4560), rec(500, 3043), rec(250, 4560)]
    );
}

#[test]
fn rests_between_notes() {
    let track = vec![
        note_on(240, 69),
        note_off(240, 69),
        note_on(480, 69),
        note_off(480, 69),
        end(240),
    ];
    assert_eq!(
        records(&smf(480, vec![track]), &Options::default()),
        vec![
            rec(250, 0),
            rec(250, 2711),
            rec(500, 0),
            rec(500, 2711),
            rec(250, 0)
        ]
    );
}

#[test]
fn long_note_is_split() {
    let track = vec![
        tempo(0, 1_000_000),
        note_on(0, 60),
        note_off(70_000, 60),
        end(0),
    ];
    assert_eq!(
        records(&smf(1000, vec![track]), &Options::default()),
        vec![rec(65535, 4560), rec(4465, 4560)]
    );
}

#[test]
fn track_selection_keeps_global_tempo() {
    let conductor = vec![tempo(0, 250_000), end(0)];
    let bass = vec![note_on(0, 48), note_off(480, 48), end(0)];
    let lead = vec![note_on(0, 72), note_off(480, 72), end(0)];
    let bytes = smf(480, vec![conductor, bass, lead]);

    let opts = Options {
        track: Some(1),
        ..Options::default()
    };
    assert_eq!(
        records(&bytes, &opts),
        vec![rec(250, divisor(48, PIT_CLOCK_HZ))]
    );

    let opts = Options {
        track: Some(3),
        ..Options::default()
    };
    assert!(matches!(
        convert(&bytes, &opts),
        Err(Error::NoSuchTrack {
            requested: 3,
            count: 3
        })
    ));
}

#[test]
fn custom_clock_changes_divisors() {
    let bytes = smf(480, vec![vec![note_on(0, 69), note_off(480, 69), end(0)]]);
    let opts = Options {
        clock_hz: 1_193_180,
        ..Options::default()
    };
    assert_eq!(records(&bytes, &opts), vec![rec(500, 2711)]);
    let opts = Options {
        clock_hz: 440_000,
        ..Options::default()
    };
    assert_eq!(records(&bytes, &opts), vec![rec(500, 1000)]);
}

#[test]
fn smpte_division_uses_the_fallback() {
    let bytes = raw_smf(0xE728, &[MIDDLE_C_QUARTER]);
    let conversion = convert(&bytes, &Options::default()).unwrap();
    assert_eq!(conversion.ticks_per_quarter, 480);
    assert_eq!(conversion.stream.records, vec![rec(500, 4560)]);
    assert!(matches!(
        conversion.warnings.as_slice(),
        [Error::UnsupportedTimeDivision(0xE728)]
    ));

    let opts = Options {
        fallback_division: 240,
        ..Options::default()
    };
    assert_eq!(records(&bytes, &opts), vec![rec(1000, 4560)]);
}

const BROKEN_TRACK: &[u8] = &[
    0x00, 0x90, 0x40, 0x64, //
    0x83, 0x60, 0xF4,
];

#[test]
fn strict_mode_rejects_a_broken_track() {
    let bytes = raw_smf(480, &[MIDDLE_C_QUARTER, BROKEN_TRACK]);
    assert!(matches!(
        convert(&bytes, &Options::default()),
        Err(Error::UnknownStatusByte {
            track: 1,
            byte: 0xF4,
            ..
        })
    ));
}

#[test]
fn best_effort_keeps_the_decodable_part() {
    let bytes = raw_smf(480, &[MIDDLE_C_QUARTER, BROKEN_TRACK]);
    let opts = Options {
        best_effort: true,
        ..Options::default()
    };
    let conversion = convert(&bytes, &opts).unwrap();
    assert_eq!(
        conversion.stream.records,
        vec![rec(500, divisor(64, PIT_CLOCK_HZ))]
    );
    assert_eq!(conversion.warnings.len(), 1);
}

#[test]
fn header_errors_are_fatal_even_in_best_effort_mode() {
    let opts = Options {
        best_effort: true,
        ..Options::default()
    };
    let mut bytes = raw_smf(480, &[MIDDLE_C_QUARTER, MIDDLE_C_QUARTER]);
    bytes.truncate(bytes.len() - MIDDLE_C_QUARTER.len() - 8);
    assert!(matches!(
        convert(&bytes, &opts),
        Err(Error::TrackCountMismatch {
            declared: 2,
            found: 1
        })
    ));
    assert!(matches!(
        convert(b"RIFF\0\0\0\x06\0\0\0\x01\x01\xE0", &opts),
        Err(Error::InvalidHeader(_))
    ));
}

#[test]
fn file_without_notes_is_only_silence() {
    let bytes = smf(480, vec![vec![tempo(0, 500_000), end(960)]]);
    assert_eq!(
        records(&bytes, &Options::default()),
        vec![rec(1000, 0)]
    );
    let bytes = smf(480, vec![vec![end(0)]]);
    assert!(records(&bytes, &Options::default()).is_empty());
}
