//! Decoded PCM held in memory for slicing.

use std::fmt::{Display, Formatter};

use crate::utils::wav::{WAV_FORMAT_IEEE_FLOAT, WAV_FORMAT_PCM};

/// Sample representation produced by the decoder and written to WAV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SampleFormat {
    /// 16-bit signed little-endian PCM.
    #[default]
    Int16,
    /// 32-bit IEEE float, little-endian.
    Float32,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::Int16 => 2,
            SampleFormat::Float32 => 4,
        }
    }

    pub const fn bits_per_sample(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }

    /// WAVE `format_tag` for this representation.
    pub const fn format_tag(self) -> u16 {
        match self {
            SampleFormat::Int16 => WAV_FORMAT_PCM,
            SampleFormat::Float32 => WAV_FORMAT_IEEE_FLOAT,
        }
    }
}

impl Display for SampleFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleFormat::Int16 => write!(f, "int16"),
            SampleFormat::Float32 => write!(f, "float32"),
        }
    }
}

/// Interleaved PCM for a whole input.
///
/// Samples are stored as little-endian bytes in `format`, ordered
/// `[frame][channel]`. The buffer is immutable once built; slice workers only
/// ever borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
    data: Vec<u8>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, format: SampleFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len() % format.bytes_per_sample(), 0);

        Self {
            sample_rate,
            channels,
            format,
            data,
        }
    }

    /// A buffer with no samples and no stream metadata, as left behind by a
    /// failed decode.
    pub fn empty(format: SampleFormat) -> Self {
        Self::new(0, 0, format, Vec::new())
    }

    pub fn from_i16(sample_rate: u32, channels: u16, samples: &[i16]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(sample_rate, channels, SampleFormat::Int16, data)
    }

    pub fn from_f32(sample_rate: u32, channels: u16, samples: &[f32]) -> Self {
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(sample_rate, channels, SampleFormat::Float32, data)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Total interleaved samples across all channels.
    pub fn num_samples(&self) -> u64 {
        (self.data.len() / self.format.bytes_per_sample()) as u64
    }

    /// Samples per channel.
    pub fn num_frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        self.num_samples() / self.channels as u64
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry() {
        let audio = AudioBuffer::from_f32(4, 2, &[0.0; 16]);
        assert_eq!(audio.num_samples(), 16);
        assert_eq!(audio.num_frames(), 8);
        assert_eq!(audio.duration_secs(), 2.0);
        assert_eq!(audio.as_bytes().len(), 64);
    }

    #[test]
    fn empty_has_no_duration() {
        let audio = AudioBuffer::empty(SampleFormat::Int16);
        assert!(audio.is_empty());
        assert_eq!(audio.num_frames(), 0);
        assert_eq!(audio.duration_secs(), 0.0);
    }

    #[test]
    fn format_fields() {
        assert_eq!(SampleFormat::Int16.format_tag(), 1);
        assert_eq!(SampleFormat::Int16.bits_per_sample(), 16);
        assert_eq!(SampleFormat::Float32.format_tag(), 3);
        assert_eq!(SampleFormat::Float32.bits_per_sample(), 32);
    }
}
