//! Time-range slicing of decoded audio into standalone WAV files.
//!
//! ## Technical Overview
//!
//! An input is decoded once into a single interleaved PCM
//! [`AudioBuffer`](structs::audio_buffer::AudioBuffer). Slice requests, given
//! as start and end times in seconds, are then mapped onto sample offsets of
//! that buffer, copied out and written as canonical 44-byte-header WAV files,
//! one worker thread per slice.
//!
//! ### Supported input
//!
//! - MPEG-1, MPEG-2 and MPEG-2.5 Layer III bitstreams, optionally behind an
//!   ID3v2 tag
//! - WAV files readable by symphonia
//!
//! ### Slice addressing
//!
//! - explicit: parallel lists of names, starts and ends
//! - auto-timed: parallel lists of starts and ends, names derived from the input
//! - fixed-length: consecutive windows of one length covering the whole input
//!
//! ## Quick Start
//!
//! 1. Decode the input with [`process::decode::Decoder`] (or
//!    [`process::wav_input::read_wav`])
//! 2. Turn the textual lists into requests with [`process::parse::parse`]
//! 3. Write them with [`process::write::SliceWriter`]
//!
//! ```rust,no_run
//! use wavslice::process::{decode::Decoder, parse::parse, write::SliceWriter};
//! use wavslice::structs::audio_buffer::SampleFormat;
//!
//! let mut decoder = Decoder::new(SampleFormat::Int16);
//! let stream = decoder.decode_file("talk.mp3");
//!
//! let requests = parse("auto", "60", "", "talk.mp3", stream.audio.duration_secs());
//! for outcome in SliceWriter::new("out").write_all(&stream.audio, &requests) {
//!     if let Err(e) = outcome.result {
//!         eprintln!("{}: {e}", outcome.output_name);
//!     }
//! }
//! ```

/// Processing stages from input bytes to WAV files.
///
/// 1. **Frame Extraction** ([`process::extract`]): sync acquisition and frame
///    boundaries.
///
/// 2. **Decoding** ([`process::decode`], [`process::wav_input`]): PCM for the
///    whole input.
///
/// 3. **Parsing** ([`process::parse`]): slice requests from textual lists.
///
/// 4. **Slicing and Writing** ([`process::slice`], [`process::write`]):
///    validation, copying and concurrent serialization.
pub mod process;

/// Data structures shared across the pipeline.
///
/// - **Audio Buffer** ([`structs::audio_buffer`]): decoded PCM and its format
/// - **Frame Header** ([`structs::frame_header`]): MPEG Layer III header fields
/// - **Slice Requests** ([`structs::slice_request`]): time windows and offsets
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **CRC Validation** ([`utils::crc`]): Frame protection check
/// - **Byte Order** ([`utils::byteorder`]): Little-endian serialization
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **WAV** ([`utils::wav`]): Container writer
pub mod utils;
