//! Timeline and tone stream dumping.

use std::cmp::max;

use midtone::{
    smf::Header,
    time::{self, MidiTimeDisplay},
    tone::ToneStream,
    Sequence,
};

pub fn header(header: &Header) {
    println!(
        "Format: {}, Tracks: {}, Division: {}",
        header.format, header.track_count, header.division
    );
}

pub fn dump(seq: &Sequence) {
    let tick_header = "Tick";
    let beat_header = "Beat";
    let track_header = "Track";

    let time = MidiTimeDisplay::new(&seq.clock, &seq.timeline);
    let widths = time.widths();
    let tick_width = max(tick_header.chars().count(), widths.tick);
    let beat_width = max(beat_header.chars().count(), widths.beat);
    let track_width = max(track_header.chars().count(), widths.track);

    header(&seq.header);
    println!();
    println!(
        "{:>tick_width$}\t{:>beat_width$}\t{:>track_width$}\tEvent",
        tick_header, beat_header, track_header,
    );
    for ev in &seq.timeline {
        println!(
            "{:>tick_width$}\t{:>beat_width$}\t{:>track_width$}\t{}",
            ev.tick,
            time.beat(ev.tick),
            format!("#{}", ev.track),
            ev.kind,
        );
    }
    let micros = time::timeline_micros(seq.clock, &seq.timeline);
    println!("\nLength: {:.3} s", micros as f64 / 1_000_000.0);
}

pub fn tones(stream: &ToneStream, clock_hz: u32) {
    let start_header = "Start";
    let duration_header = "Duration";
    let divisor_header = "Divisor";

    let total = stream.total_ms();
    let start_width = max(start_header.chars().count(), total.to_string().len());
    let duration_width = duration_header.chars().count();
    let divisor_width = divisor_header.chars().count();

    println!(
        "{:>start_width$}\t{:>duration_width$}\t{:>divisor_width$}\tFrequency",
        start_header, duration_header, divisor_header,
    );
    let mut start: u64 = 0;
    for record in &stream.records {
        let frequency = if record.is_rest() {
            "rest".to_string()
        } else {
            format!("{:.2} Hz", f64::from(clock_hz) / f64::from(record.divisor))
        };
        println!(
            "{:>start_width$}\t{:>duration_width$}\t{:>divisor_width$}\t{frequency}",
            start, record.duration_ms, record.divisor,
        );
        start += u64::from(record.duration_ms);
    }
    println!("\n{} records, {total} ms", stream.len());
}
