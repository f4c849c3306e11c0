/// Frame extraction from MPEG audio bitstreams.
///
/// Provides the [`Extractor`](extract::Extractor) for acquiring sync and
/// yielding individual [`Frame`](extract::Frame) objects from the input bytes.
pub mod extract;

/// Frame decoding into one contiguous PCM buffer.
///
/// Provides the [`Decoder`](decode::Decoder) that drives a
/// [`FrameDecoder`](decode::FrameDecoder) over every extracted frame under a
/// bounded memory budget.
pub mod decode;

/// Decoding of WAV input through the container reader.
pub mod wav_input;

/// Slice specification parsing.
///
/// Provides [`parse`](parse::parse), which turns the three textual lists of
/// the command line into [`SliceRequest`](crate::structs::slice_request::SliceRequest)s.
pub mod parse;

/// Time range to sample range mapping and slice copying.
pub mod slice;

/// Concurrent slice extraction and WAV writing.
///
/// Provides the [`SliceWriter`](write::SliceWriter), which runs one worker
/// thread per request against a shared [`AudioBuffer`](crate::structs::audio_buffer::AudioBuffer).
pub mod write;

/// Upper bound on slice requests, and so on concurrent slice workers.
pub const MAX_SLICES: usize = 400;

/// Largest decoded frame: 1152 samples for each of two channels.
pub const MAX_SAMPLES_PER_FRAME: usize = 2304;
