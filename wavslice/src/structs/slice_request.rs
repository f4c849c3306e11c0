//! Slice requests and the offset types derived from them.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::structs::audio_buffer::SampleFormat;

/// One time window to cut out of the decoded audio and write as
/// `<output_name>.wav`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRequest {
    pub start_s: f64,
    pub end_s: f64,
    pub output_name: String,
}

impl SliceRequest {
    pub fn new<S: Into<String>>(start_s: f64, end_s: f64, output_name: S) -> Self {
        Self {
            start_s,
            end_s,
            output_name: output_name.into(),
        }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

impl Display for SliceRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:.3}s, {:.3}s)",
            self.output_name, self.start_s, self.end_s
        )
    }
}

/// How the three textual lists on the command line are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceAddressingMode {
    /// Parallel lists of names, starts and ends.
    Explicit {
        names: Vec<String>,
        starts: Vec<f64>,
        ends: Vec<f64>,
    },
    /// Parallel lists of starts and ends; names derive from the input file.
    AutoTimed { starts: Vec<f64>, ends: Vec<f64> },
    /// Consecutive windows of equal length covering the whole buffer.
    FixedLength { segment_length_s: f64 },
}

/// Half-open range of interleaved samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: u64,
    pub end: u64,
}

impl SampleRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn to_byte_range(self, format: SampleFormat) -> ByteRange {
        let bytes = format.bytes_per_sample();
        ByteRange {
            offset: self.start as usize * bytes,
            length: self.len() as usize * bytes,
        }
    }
}

/// Owned offset/length pair into a sample byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

impl ByteRange {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn as_range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

#[test]
fn sample_to_byte_range() {
    let range = SampleRange { start: 6, end: 10 };
    let bytes = range.to_byte_range(SampleFormat::Float32);
    assert_eq!(bytes, ByteRange { offset: 24, length: 16 });
    assert_eq!(bytes.as_range(), 24..40);
    assert_eq!(range.to_byte_range(SampleFormat::Int16).as_range(), 12..20);
}

#[test]
fn request_display_and_duration() {
    let request = SliceRequest::new(1.5, 4.0, "verse");
    assert_eq!(request.duration_s(), 2.5);
    assert_eq!(request.to_string(), "verse [1.500s, 4.000s)");
    assert!(SampleRange { start: 3, end: 3 }.is_empty());
}
