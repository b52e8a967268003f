use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use snafu::{ResultExt, Snafu};

use cwskim::params::FrameParams;
use cwskim::skimmer::{self, Skimmer, SkimmerConfig};
use cwskim::spectral::{FrontEndConfig, SampleFormat};
use cwskim::tracing_init;

/// Multichannel Morse skimmer: reads raw mono PCM, decodes CW on every
/// ~100 Hz channel and prints "freq:text" lines.
///
/// The built-in help flag is disabled: usage must go to standard error,
/// while clap prints its help to standard output.
#[derive(Debug, Parser)]
#[command(name = "cwskim", version, disable_help_flag = true)]
struct Cli {
    /// Sample rate in Hz, clamped to 8000..=48000
    #[arg(short = 'r', value_name = "RATE", default_value_t = 48000)]
    sample_rate: u32,

    /// Characters pending before a channel line is printed, clamped to 1..=32
    #[arg(short = 'n', value_name = "CHARS", default_value_t = 8)]
    print_chars: usize,

    /// Input is signed 16-bit little-endian PCM
    #[arg(short = 'i', overrides_with = "float_input")]
    int_input: bool,

    /// Input is 32-bit little-endian float PCM (default)
    #[arg(short = 'f', overrides_with = "int_input")]
    float_input: bool,

    /// Decoders also emit their dit/dah element trace
    #[arg(short = 'c')]
    show_cw: bool,

    /// Per-frame diagnostic line on standard error
    #[arg(short = 'd')]
    diagnostics: bool,

    /// Print usage to standard error and exit
    #[arg(short = 'h')]
    help: bool,

    /// Input file (defaults to standard input)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file (defaults to standard output)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("cannot open input file '{}': {source}", path.display()))]
    OpenInput { path: PathBuf, source: io::Error },

    #[snafu(display("cannot create output file '{}': {source}", path.display()))]
    OpenOutput { path: PathBuf, source: io::Error },

    #[snafu(display("{source}"))]
    Skim { source: skimmer::Error },
}

fn main() -> ExitCode {
    tracing_init::init_tracing();
    // clap exits with code 2 on bad flags, per the CLI contract
    let cli = Cli::parse();
    if cli.help {
        let _ = write!(io::stderr(), "{}", Cli::command().render_help());
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cwskim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let params = FrameParams::new(cli.sample_rate, cli.print_chars);
    // -i and -f override each other; float is the default
    let format = match (cli.int_input, cli.float_input) {
        (true, _) => SampleFormat::S16Le,
        (false, _) => SampleFormat::F32Le,
    };
    let config = SkimmerConfig {
        params,
        front_end: FrontEndConfig {
            format,
            ..FrontEndConfig::default()
        },
        show_cw: cli.show_cw,
        diagnostics: cli.diagnostics,
        ..SkimmerConfig::default()
    };

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(File::open(path).context(OpenInputSnafu { path: path.clone() })?),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => {
            Box::new(File::create(path).context(OpenOutputSnafu { path: path.clone() })?)
        }
        None => Box::new(io::stdout().lock()),
    };

    let stats = Skimmer::new(input, output, config).run().context(SkimSnafu)?;
    tracing::info!(
        frames = stats.frames,
        dropped = stats.dropped_bursts,
        "done"
    );
    Ok(())
}
