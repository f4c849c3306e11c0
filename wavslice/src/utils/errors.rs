use std::io;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Truncated frame at end of stream: frame needs {needed} bytes, {available} remain")]
    InsufficientData { needed: usize, available: usize },

    #[error("Invalid sync pattern detected")]
    InvalidSyncPattern,

    #[error("Reserved MPEG version id")]
    ReservedVersion,

    #[error("Only Layer III is supported. Read layer bits {0:#04b}")]
    UnsupportedLayer(u8),

    #[error("Invalid bitrate index {0}")]
    InvalidBitrate(u8),

    #[error("Invalid sampling frequency index {0}")]
    InvalidSampleRate(u8),

    #[error(
        "CRC failed on frame at byte {offset}. Calculated {calculated:#06X}, Read {read:#06X}"
    )]
    CrcMismatch {
        offset: usize,
        calculated: u16,
        read: u16,
    },

    #[error("Header read failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to reserve {bytes} bytes for decoded PCM")]
    Allocation { bytes: usize },

    #[error("Codec error: {0}")]
    Codec(#[from] symphonia::core::errors::Error),

    #[error("Input does not provide a decodable audio track")]
    NoTrack,

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(thiserror::Error, Debug)]
pub enum SliceError {
    #[error("Decoded audio is empty, no slice can be taken")]
    EmptyBuffer,

    #[error("Start time {0}s is negative")]
    NegativeStart(f64),

    #[error("End time {end}s is not after start time {start}s")]
    InvertedRange { start: f64, end: f64 },

    #[error("End time {end}s exceeds decoded duration {duration}s")]
    EndBeyondDuration { end: f64, duration: f64 },

    #[error("Sample range {start}..{end} is outside the {len} decoded samples")]
    SampleRangeOutOfBounds { start: u64, end: u64, len: u64 },

    #[error("Failed to reserve {bytes} bytes for slice")]
    Allocation { bytes: usize },

    #[error("Failed to write slice: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to spawn slice worker: {0}")]
    Spawn(io::Error),

    #[error("Not started because an earlier slice worker failed to spawn")]
    NotStarted,

    #[error("Slice worker panicked")]
    WorkerPanicked,
}

impl SliceError {
    /// Whether the request itself was rejected (skipped) rather than failing
    /// while being written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SliceError::EmptyBuffer
                | SliceError::NegativeStart(_)
                | SliceError::InvertedRange { .. }
                | SliceError::EndBeyondDuration { .. }
                | SliceError::SampleRangeOutOfBounds { .. }
        )
    }
}
