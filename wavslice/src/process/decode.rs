use std::fmt::{Display, Formatter};
use std::path::Path;

use log::{debug, error, info, warn};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_MP3, CodecParameters, DecoderOptions};
use symphonia::core::formats::Packet;

use crate::log_or_err;
use crate::process::MAX_SAMPLES_PER_FRAME;
use crate::process::extract::{Extractor, Frame};
use crate::structs::audio_buffer::{AudioBuffer, SampleFormat};
use crate::structs::frame_header::FrameHeader;
use crate::utils::errors::{DecodeError, ExtractError};

/// Audio of a single frame, interleaved little-endian in the decoder's
/// [`SampleFormat`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub channels: u16,
    pub sample_rate: u32,
    /// Samples per channel.
    pub frames: usize,
    pub data: Vec<u8>,
}

/// Per-frame audio decoding used by [`Decoder`].
pub trait FrameDecoder {
    /// Sample format of every [`DecodedFrame::data`] this decoder produces.
    fn format(&self) -> SampleFormat;

    /// Drops all inter-frame state, such as the bit reservoir.
    fn reset(&mut self);

    fn decode_frame(&mut self, frame: &Frame) -> Result<DecodedFrame, DecodeError>;
}

/// [`FrameDecoder`] backed by symphonia's MPEG audio codec.
pub struct SymphoniaFrameDecoder {
    format: SampleFormat,
    decoder: Option<Box<dyn symphonia::core::codecs::Decoder>>,
    ts: u64,
}

impl SymphoniaFrameDecoder {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            decoder: None,
            ts: 0,
        }
    }

    fn decoder_for(
        &mut self,
        header: &FrameHeader,
    ) -> Result<&mut Box<dyn symphonia::core::codecs::Decoder>, DecodeError> {
        if self.decoder.is_none() {
            let mut params = CodecParameters::new();
            params
                .for_codec(CODEC_TYPE_MP3)
                .with_sample_rate(header.sample_rate);

            let decoder =
                symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;
            self.decoder = Some(decoder);
        }

        self.decoder.as_mut().ok_or(DecodeError::NoTrack)
    }
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn format(&self) -> SampleFormat {
        self.format
    }

    fn reset(&mut self) {
        self.decoder = None;
        self.ts = 0;
    }

    fn decode_frame(&mut self, frame: &Frame) -> Result<DecodedFrame, DecodeError> {
        let ts = self.ts;
        let format = self.format;
        let duration = frame.header.samples_per_frame() as u64;

        let decoder = self.decoder_for(&frame.header)?;
        let packet = Packet::new_from_slice(0, ts, duration, frame.data);
        let decoded = decoder.decode(&packet)?;

        let spec = *decoded.spec();
        let frames = decoded.frames();
        let data = interleaved_bytes(decoded, format);

        self.ts += frames as u64;

        Ok(DecodedFrame {
            channels: spec.channels.count() as u16,
            sample_rate: spec.rate,
            frames,
            data,
        })
    }
}

/// Interleaves a symphonia buffer into little-endian bytes of `format`.
pub(crate) fn interleaved_bytes(decoded: AudioBufferRef<'_>, format: SampleFormat) -> Vec<u8> {
    let duration = decoded.capacity() as u64;
    let spec = *decoded.spec();

    match format {
        SampleFormat::Int16 => {
            let mut buf = SampleBuffer::<i16>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            buf.samples().iter().flat_map(|s| s.to_le_bytes()).collect()
        }
        SampleFormat::Float32 => {
            let mut buf = SampleBuffer::<f32>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            buf.samples().iter().flat_map(|s| s.to_le_bytes()).collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialReason {
    /// The last frame was cut short by the end of the input.
    TruncatedFrame,
    /// The next frame would have exceeded the PCM budget.
    CapacityReached,
}

#[derive(Debug)]
pub enum DecodeStatus {
    Complete,
    Partial(PartialReason),
    Failed(DecodeError),
}

impl DecodeStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, DecodeStatus::Complete)
    }
}

impl Display for DecodeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeStatus::Complete => write!(f, "complete"),
            DecodeStatus::Partial(PartialReason::TruncatedFrame) => {
                write!(f, "partial (truncated frame)")
            }
            DecodeStatus::Partial(PartialReason::CapacityReached) => {
                write!(f, "partial (capacity reached)")
            }
            DecodeStatus::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Outcome of decoding a whole input.
///
/// `audio` always holds whatever was decoded before the status was decided,
/// which is an empty buffer when nothing could be decoded at all.
#[derive(Debug)]
pub struct DecodedStream {
    pub audio: AudioBuffer,
    pub status: DecodeStatus,
    /// Frames that contributed samples.
    pub frames: usize,
}

impl DecodedStream {
    pub fn failed(format: SampleFormat, error: DecodeError) -> Self {
        Self {
            audio: AudioBuffer::empty(format),
            status: DecodeStatus::Failed(error),
            frames: 0,
        }
    }
}

/// Decodes a complete MP3 byte buffer into one [`AudioBuffer`].
///
/// The decoder is owned by the caller and keeps no state between calls: every
/// [`decode`](Decoder::decode) starts from a reset [`FrameDecoder`].
///
/// ```rust,no_run
/// use wavslice::process::decode::Decoder;
/// use wavslice::structs::audio_buffer::SampleFormat;
///
/// let mut decoder = Decoder::new(SampleFormat::Int16);
/// let stream = decoder.decode_file("input.mp3");
/// println!(
///     "{} ({:.3}s at {} Hz)",
///     stream.status,
///     stream.audio.duration_secs(),
///     stream.audio.sample_rate()
/// );
/// ```
pub struct Decoder<D: FrameDecoder = SymphoniaFrameDecoder> {
    frame_decoder: D,
    fail_level: log::Level,
}

impl Decoder<SymphoniaFrameDecoder> {
    pub fn new(format: SampleFormat) -> Self {
        Self::with_frame_decoder(SymphoniaFrameDecoder::new(format))
    }
}

impl<D: FrameDecoder> Decoder<D> {
    pub fn with_frame_decoder(frame_decoder: D) -> Self {
        Self {
            frame_decoder,
            fail_level: log::Level::Error,
        }
    }

    /// Sets the failure level for recoverable stream errors.
    ///
    /// - `log::Level::Error`: CRC mismatches and frame decode errors are logged
    ///   and decoding continues (default)
    /// - `log::Level::Warn`: they end decoding with [`DecodeStatus::Failed`]
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn format(&self) -> SampleFormat {
        self.frame_decoder.format()
    }

    /// Reads and decodes the file at `path`. An unreadable file yields an
    /// empty buffer with a failed status.
    pub fn decode_file<P: AsRef<Path>>(&mut self, path: P) -> DecodedStream {
        match std::fs::read(path.as_ref()) {
            Ok(data) => self.decode(&data),
            Err(e) => {
                error!("Failed to read {}: {e}", path.as_ref().display());
                DecodedStream::failed(self.format(), DecodeError::Io(e))
            }
        }
    }

    pub fn decode(&mut self, data: &[u8]) -> DecodedStream {
        self.decode_with_progress(data, |_| {})
    }

    /// Like [`decode`](Decoder::decode), calling `on_progress` with the number
    /// of input bytes consumed after every frame.
    pub fn decode_with_progress<F>(&mut self, data: &[u8], mut on_progress: F) -> DecodedStream
    where
        F: FnMut(usize),
    {
        let format = self.format();
        self.frame_decoder.reset();

        if data.is_empty() {
            return DecodedStream {
                audio: AudioBuffer::empty(format),
                status: DecodeStatus::Complete,
                frames: 0,
            };
        }

        let max_pcm_samples = data.len().saturating_mul(MAX_SAMPLES_PER_FRAME) / 128;
        let capacity = max_pcm_samples
            .saturating_mul(2)
            .saturating_mul(format.bytes_per_sample());

        let mut pcm = Vec::new();
        if pcm.try_reserve_exact(capacity).is_err() {
            error!("Failed to reserve {capacity} bytes for decoded PCM");
            return DecodedStream::failed(format, DecodeError::Allocation { bytes: capacity });
        }
        debug!("Reserved {capacity} bytes for at most {max_pcm_samples} samples");

        let mut extractor = Extractor::new(data);
        extractor.set_fail_level(self.fail_level);

        let mut status = DecodeStatus::Complete;
        let mut channels = 0u16;
        let mut sample_rate = 0u32;
        let mut decoded_frames = 0usize;
        let mut frames = 0usize;

        while let Some(result) = extractor.next() {
            let frame = match result {
                Ok(frame) => frame,
                Err(e @ ExtractError::InsufficientData { .. }) => {
                    warn!("{e}");
                    status = DecodeStatus::Partial(PartialReason::TruncatedFrame);
                    break;
                }
                Err(e) => {
                    error!("Stopping decode at byte {}: {e}", extractor.position());
                    status = DecodeStatus::Failed(DecodeError::Extract(e));
                    break;
                }
            };

            if extractor.frames_processed() == 1 && frame.is_info_frame() {
                debug!("Skipping Xing/Info header frame at byte {}", frame.offset);
                continue;
            }

            let decoded = match self.decode_one(&frame) {
                Ok(Some(decoded)) => decoded,
                Ok(None) => continue,
                Err(e) => {
                    error!("Stopping decode at byte {}: {e}", frame.offset);
                    status = DecodeStatus::Failed(e);
                    break;
                }
            };

            if decoded.frames == 0 {
                continue;
            }

            if (decoded_frames + decoded.frames) * 2 > max_pcm_samples {
                warn!(
                    "PCM budget of {max_pcm_samples} samples reached at byte {}",
                    frame.offset
                );
                status = DecodeStatus::Partial(PartialReason::CapacityReached);
                break;
            }

            if frames > 0 && (decoded.channels != channels || decoded.sample_rate != sample_rate) {
                warn!(
                    "Stream changes from {channels} ch {sample_rate} Hz to {} ch {} Hz at byte {}",
                    decoded.channels, decoded.sample_rate, frame.offset
                );
            }

            pcm.extend_from_slice(&decoded.data);
            decoded_frames += decoded.frames;
            channels = decoded.channels;
            sample_rate = decoded.sample_rate;
            frames += 1;

            on_progress(extractor.position());
        }

        if extractor.resyncs() > 0 || extractor.skipped_bytes() > 0 {
            debug!(
                "Skipped {} bytes over {} resyncs while extracting {} frames",
                extractor.skipped_bytes(),
                extractor.resyncs(),
                extractor.frames_processed()
            );
        }

        let audio = AudioBuffer::new(sample_rate, channels, format, pcm);
        info!(
            "Decoded {frames} frames: {} Hz, {} channels, {:.3}s ({status})",
            audio.sample_rate(),
            audio.channels(),
            audio.duration_secs()
        );

        DecodedStream {
            audio,
            status,
            frames,
        }
    }

    /// Decodes one frame; a codec error is either logged and the frame
    /// dropped, or returned when the fail level asks for it.
    fn decode_one(&mut self, frame: &Frame) -> Result<Option<DecodedFrame>, DecodeError> {
        match self.frame_decoder.decode_frame(frame) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                log_or_err!(self, log::Level::Warn, e);
                Ok(None)
            }
        }
    }
}
