use log::debug;

use crate::structs::audio_buffer::{AudioBuffer, SampleFormat};
use crate::structs::slice_request::{SampleRange, SliceRequest};
use crate::utils::errors::SliceError;

/// Owned copy of one slice, ready to be serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSlice {
    pub data: Vec<u8>,
    /// Samples per channel.
    pub frames: u64,
    pub channels: u16,
    pub sample_rate: u32,
    pub format: SampleFormat,
}

impl ExtractedSlice {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Maps the request's time window onto interleaved sample offsets, rejecting
/// any window that does not lie inside the buffer.
pub fn sample_range(
    buffer: &AudioBuffer,
    request: &SliceRequest,
) -> Result<SampleRange, SliceError> {
    if buffer.is_empty() || buffer.sample_rate() == 0 {
        return Err(SliceError::EmptyBuffer);
    }

    let (start_s, end_s) = (request.start_s, request.end_s);
    let duration = buffer.duration_secs();

    // negated comparisons also reject NaN
    if !(start_s >= 0.0) {
        return Err(SliceError::NegativeStart(start_s));
    }
    if !(end_s > start_s) {
        return Err(SliceError::InvertedRange {
            start: start_s,
            end: end_s,
        });
    }
    if end_s > duration {
        return Err(SliceError::EndBeyondDuration {
            end: end_s,
            duration,
        });
    }

    let rate = buffer.sample_rate() as f64;
    let channels = buffer.channels().max(1) as u64;
    let range = SampleRange {
        start: (start_s * rate).trunc() as u64 * channels,
        end: (end_s * rate).trunc() as u64 * channels,
    };

    let len = buffer.num_samples();
    if range.start > range.end || range.end > len {
        return Err(SliceError::SampleRangeOutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }

    Ok(range)
}

/// Copies the samples of `request` out of `buffer`.
pub fn extract(
    buffer: &AudioBuffer,
    request: &SliceRequest,
) -> Result<ExtractedSlice, SliceError> {
    let range = sample_range(buffer, request)?;
    if range.is_empty() {
        debug!("Slice {request} is shorter than one sample period");
    }
    let bytes = range.to_byte_range(buffer.format());

    let source = buffer
        .as_bytes()
        .get(bytes.as_range())
        .ok_or(SliceError::SampleRangeOutOfBounds {
            start: range.start,
            end: range.end,
            len: buffer.num_samples(),
        })?;

    let mut data = Vec::new();
    data.try_reserve_exact(bytes.length)
        .map_err(|_| SliceError::Allocation {
            bytes: bytes.length,
        })?;
    data.extend_from_slice(source);

    let channels = buffer.channels().max(1);
    Ok(ExtractedSlice {
        data,
        frames: range.len() / channels as u64,
        channels,
        sample_rate: buffer.sample_rate(),
        format: buffer.format(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 Hz stereo, 2 seconds, sample value = interleaved index.
    fn counting_buffer() -> AudioBuffer {
        let samples: Vec<i16> = (0..40).collect();
        AudioBuffer::from_i16(10, 2, &samples)
    }

    #[test]
    fn copies_the_exact_region() -> Result<(), SliceError> {
        let buffer = counting_buffer();
        let request = SliceRequest::new(0.5, 1.25, "mid");

        let range = sample_range(&buffer, &request)?;
        assert_eq!(range, SampleRange { start: 10, end: 24 });

        let slice = extract(&buffer, &request)?;
        assert_eq!(slice.data.len(), (24 - 10) * 2);
        assert_eq!(slice.data, &buffer.as_bytes()[20..48]);
        assert_eq!(slice.frames, 7);
        assert_eq!(slice.channels, 2);
        assert_eq!(slice.duration_secs(), 0.7);
        Ok(())
    }

    #[test]
    fn whole_buffer() -> Result<(), SliceError> {
        let buffer = counting_buffer();
        let slice = extract(&buffer, &SliceRequest::new(0.0, 2.0, "all"))?;

        assert_eq!(slice.data, buffer.as_bytes());
        Ok(())
    }

    #[test]
    fn float_region() -> Result<(), SliceError> {
        let samples: Vec<f32> = (0..8).map(|i| i as f32 * 0.125).collect();
        let buffer = AudioBuffer::from_f32(4, 1, &samples);

        let slice = extract(&buffer, &SliceRequest::new(1.0, 1.5, "f"))?;
        assert_eq!(slice.format, SampleFormat::Float32);
        assert_eq!(slice.data, &buffer.as_bytes()[16..24]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_windows() {
        let buffer = counting_buffer();
        let check =
            |start, end| extract(&buffer, &SliceRequest::new(start, end, "x")).unwrap_err();

        assert!(matches!(check(-0.1, 1.0), SliceError::NegativeStart(_)));
        assert!(matches!(check(1.0, 1.0), SliceError::InvertedRange { .. }));
        assert!(matches!(check(1.5, 0.5), SliceError::InvertedRange { .. }));
        assert!(matches!(check(f64::NAN, 1.0), SliceError::NegativeStart(_)));
        assert!(matches!(
            check(1.0, 2.01),
            SliceError::EndBeyondDuration { .. }
        ));
        assert!(check(0.0, 2.5).is_validation());
    }

    #[test]
    fn sub_sample_window() -> Result<(), SliceError> {
        let buffer = counting_buffer();
        let slice = extract(&buffer, &SliceRequest::new(0.51, 0.55, "tiny"))?;

        assert!(slice.data.is_empty());
        assert_eq!(slice.frames, 0);
        Ok(())
    }

    #[test]
    fn empty_buffer() {
        let buffer = AudioBuffer::empty(SampleFormat::Int16);
        let err = extract(&buffer, &SliceRequest::new(0.0, 1.0, "x")).unwrap_err();

        assert!(matches!(err, SliceError::EmptyBuffer));
        assert!(err.is_validation());
    }
}
