mod dump;

use std::{error::Error, path::PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use midtone::{batch, time::FALLBACK_TICKS_PER_QUARTER, tone::PIT_CLOCK_HZ, Options};

struct HelpTemplate {}

const INDENT: &str = "  ";

impl From<HelpTemplate> for clap::builder::StyledStr {
    fn from(_: HelpTemplate) -> Self {
        format!(
            "{{about-with-newline}}
{{usage-heading}}
{INDENT}{{usage}}

{{all-args}}{{after-help}}",
        )
        .into()
    }
}

fn help() -> HelpTemplate {
    HelpTemplate {}
}

#[derive(Args)]
struct ConvertOptions {
    /// Keeps the events before a decoding error in a track instead of aborting the conversion.
    #[arg(long)]
    best_effort: bool,

    /// Only plays the notes of this 0-based track. Tempo changes from all tracks still apply.
    #[arg(long, value_name = "N")]
    track: Option<usize>,

    /// Input clock of the timer that drives the speaker, in Hz.
    #[arg(
        long,
        value_name = "HZ",
        default_value_t = PIT_CLOCK_HZ,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    clock: u32,

    /// Ticks per quarter note to assume for SMPTE-timed sequences.
    #[arg(
        long,
        value_name = "TPQN",
        default_value_t = FALLBACK_TICKS_PER_QUARTER,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    fallback_division: u16,
}

impl From<&ConvertOptions> for Options {
    fn from(args: &ConvertOptions) -> Self {
        Options {
            best_effort: args.best_effort,
            track: args.track,
            clock_hz: args.clock,
            fallback_division: args.fallback_division,
        }
    }
}

#[derive(Subcommand)]
enum CliCommand {
    /// Converts a Standard MIDI File into a PC-speaker tone stream.
    ///
    /// The output is a sequence of little-endian (duration in ms, timer divisor) word pairs,
    /// terminated by (0, 0). Whenever several notes sound at once, the highest one is played.
    /// Nothing is written if the input can't be converted.
    #[command(help_template = help())]
    Convert {
        /// Standard MIDI File to read.
        input: PathBuf,

        /// Tone stream to write.
        output: PathBuf,

        #[command(flatten)]
        opts: ConvertOptions,
    },

    /// Dumps the merged event timeline to stdout, with one event per line.
    ///
    /// For easier navigation, the output also contains the 0-based *quarter-note:tick* beat
    /// number and the track each event came from.
    #[command(help_template = help())]
    Dump {
        input: PathBuf,

        #[command(flatten)]
        opts: ConvertOptions,
    },

    /// Lists the records of an existing tone stream.
    #[command(help_template = help())]
    Tones {
        input: PathBuf,

        /// Timer input clock used to show frequencies, in Hz.
        #[arg(long, value_name = "HZ", default_value_t = PIT_CLOCK_HZ)]
        clock: u32,
    },

    /// Converts several files in parallel, writing `<stem>.bin` files into one directory.
    #[command(help_template = help())]
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the tone streams. Created if missing.
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        #[command(flatten)]
        opts: ConvertOptions,
    },
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_about,
    infer_subcommands = true,
    subcommand_help_heading = "Commands (partial matches are supported)",
    help_template = help(),
    after_help = &format!(
        "\x1B[4;1mTone stream format:\x1B[0m
{INDENT}Little-endian (duration in ms: u16, timer divisor: u16) records, ending with (0, 0).
{INDENT}A record sounds clock / divisor Hz. Divisor 0 is a rest."
    ),
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Logs more details to stderr. Repeat for even more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only logs errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    match args.command {
        CliCommand::Convert {
            input,
            output,
            opts,
        } => {
            let conversion = midtone::convert_file(&input, &output, &(&opts).into())?;
            dump::header(&conversion.header);
            println!(
                "Wrote {} records ({} ms) to {}",
                conversion.stream.len(),
                conversion.stream.total_ms(),
                output.display()
            );
        }
        CliCommand::Dump { input, opts } => {
            let bytes = midtone::read_file(&input)?;
            let sequence = midtone::decode(&bytes, &(&opts).into())?;
            dump::dump(&sequence);
        }
        CliCommand::Tones { input, clock } => {
            dump::tones(&midtone::read_stream(&input)?, clock);
        }
        CliCommand::Batch {
            inputs,
            out_dir,
            opts,
        } => {
            let items = batch::convert_all(&inputs, &out_dir, &(&opts).into())?;
            let mut failed = 0;
            for item in &items {
                match &item.result {
                    Ok(conversion) => println!(
                        "{} -> {}: {} records ({} ms)",
                        item.input.display(),
                        item.output.display(),
                        conversion.stream.len(),
                        conversion.stream.total_ms()
                    ),
                    Err(e) => {
                        eprintln!("{}: error: {e}", item.input.display());
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                let total = items.len();
                return Err(format!("{failed} of {total} files could not be converted").into());
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    if let Err(e) = run(cli) {
        let args = std::env::args()
            .skip(1)
            .fold(String::new(), |a, b| a + " " + &b);
        eprintln!(
            "`{}{args}`: error: {e}",
            std::env::current_exe()
                .ok()
                .as_ref()
                .and_then(|p| p.file_stem())
                .map(|p| p.to_string_lossy())
                .unwrap_or(env!("CARGO_PKG_NAME").into())
        );
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn top_level_help_describes_the_record_layout() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("Tone stream format:"));
        assert!(help.contains("ending with (0, 0)"));
        assert!(help.contains("Divisor 0 is a rest."));
    }
}
