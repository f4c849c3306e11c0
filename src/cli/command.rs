use std::path::PathBuf;

use clap::{Parser as ClapParser, ValueEnum};
use wavslice::structs::audio_buffer::SampleFormat;

pub const MODES_HELP: &str = "\
Slice addressing modes:
  Explicit names     OUTPUTS is a list of names, one file per name
                       wavsliced in.mp3 intro,verse 0,12.5 12.5,40
  Auto-timed         OUTPUTS is \"auto\", files are named <stem>_1, <stem>_2, ...
                       wavsliced in.mp3 auto 0,30 30,60
  Fixed-length       OUTPUTS is \"auto\" and STARTS is a whole number of
                     seconds, files are named <stem>_part_1, ... (ENDS ignored)
                       wavsliced in.mp3 auto 30 -

Lists are comma-delimited; the shortest list decides how many slices are made.";

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\nwavslice ", env!("WAVSLICE_VERSION"),
        "\nbuilt ", env!("BUILD_TIMESTAMP"),
    ),
    about        = "Cut MP3 or WAV input into time-bounded WAV slices",
    long_about   = None,
    after_help   = MODES_HELP,
)]
pub struct Cli {
    /// Input MP3 or WAV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output names, or "auto" to derive them from the input name.
    #[arg(value_name = "OUTPUTS", allow_hyphen_values = true)]
    pub outputs: String,

    /// Start times in seconds, or the segment length in fixed-length mode.
    #[arg(value_name = "STARTS", allow_hyphen_values = true)]
    pub starts: String,

    /// End times in seconds.
    #[arg(value_name = "ENDS", allow_hyphen_values = true)]
    pub ends: String,

    /// Set the log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors and exit non-zero if any slice fails.
    #[arg(long)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long)]
    pub progress: bool,

    /// Sample format of the decoded audio and the written slices.
    #[arg(long, value_enum, default_value_t = SampleFormatArg::Int16)]
    pub format: SampleFormatArg,

    /// Directory for the written slices.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub output_dir: PathBuf,

    /// Fail a slice instead of replacing an existing file.
    #[arg(long)]
    pub no_overwrite: bool,

    /// Decode and print the planned slices without writing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a YAML summary of the run.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Level at which recoverable stream errors become fatal.
    pub fn fail_level(&self) -> log::Level {
        if self.strict {
            log::Level::Warn
        } else {
            log::Level::Error
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum SampleFormatArg {
    /// 16-bit signed integer PCM.
    Int16,
    /// 32-bit IEEE float.
    Float32,
}

impl From<SampleFormatArg> for SampleFormat {
    fn from(arg: SampleFormatArg) -> Self {
        match arg {
            SampleFormatArg::Int16 => SampleFormat::Int16,
            SampleFormatArg::Float32 => SampleFormat::Float32,
        }
    }
}
