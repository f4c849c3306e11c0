//! Canonical 44-byte RIFF/WAVE container writer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;
use wavsliced_macros::{ToBytes, riff_chunk};

use crate::join_bytes_le;
use crate::structs::audio_buffer::SampleFormat;

pub const WAV_FORMAT_PCM: u16 = 1;
pub const WAV_FORMAT_IEEE_FLOAT: u16 = 3;

pub const WAV_HEADER_LEN: u64 = 44;

/// Bytes between the RIFF length field and the sample payload.
const RIFF_OVERHEAD: u32 = 36;

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.chunk_id())?;

        let chunk_data = self.chunk_data();
        writer.write_all(&(chunk_data.len() as u32).to_le_bytes())?;
        writer.write_all(&chunk_data)?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToBytes)]
#[riff_chunk(b"fmt ")]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// Stream parameters of one WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub format: SampleFormat,
}

impl WavSpec {
    pub fn block_align(&self) -> u16 {
        self.channels * self.format.bytes_per_sample() as u16
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    pub fn format_chunk(&self) -> FormatChunk {
        FormatChunk {
            format_tag: self.format.format_tag(),
            channels: self.channels,
            sample_rate: self.sample_rate,
            byte_rate: self.byte_rate(),
            block_align: self.block_align(),
            bits_per_sample: self.format.bits_per_sample(),
        }
    }

    /// Payload size of `sample_count` frames, rejected when it cannot be
    /// expressed in the 32-bit RIFF length fields.
    pub fn data_length(&self, sample_count: u64) -> io::Result<u32> {
        sample_count
            .checked_mul(self.block_align() as u64)
            .and_then(|len| u32::try_from(len).ok())
            .filter(|len| *len <= u32::MAX - RIFF_OVERHEAD)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{sample_count} frames do not fit in a WAV data chunk"),
                )
            })
    }
}

/// Writes a header sized up front, then exactly `data_length` payload bytes.
pub struct WavWriter<W: Write> {
    writer: BufWriter<W>,
    spec: WavSpec,
    data_length: u32,
    data_written: u64,
    header_written: bool,
}

impl<W: Write> WavWriter<W> {
    pub fn new(writer: W, spec: WavSpec, sample_count: u64) -> io::Result<Self> {
        let data_length = spec.data_length(sample_count)?;

        Ok(Self {
            writer: BufWriter::new(writer),
            spec,
            data_length,
            data_written: 0,
            header_written: false,
        })
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAV header already written",
            ));
        }

        let riff = join_bytes_le!(*b"RIFF", self.data_length + RIFF_OVERHEAD, *b"WAVE");
        self.writer.write_all(&riff)?;
        self.spec.format_chunk().write_all(&mut self.writer)?;
        self.writer
            .write_all(&join_bytes_le!(*b"data", self.data_length))?;

        self.header_written = true;
        Ok(())
    }

    pub fn write_samples(&mut self, data: &[u8]) -> io::Result<()> {
        if !self.header_written {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Must call write_header() before write_samples()",
            ));
        }
        if self.data_written + data.len() as u64 > self.data_length as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Sample payload exceeds the declared data length",
            ));
        }

        self.writer.write_all(data)?;
        self.data_written += data.len() as u64;
        Ok(())
    }

    /// Flushes and returns the inner writer. A payload shorter than declared
    /// would leave a lying header, so it is an error.
    pub fn finish(mut self) -> io::Result<W> {
        if self.data_written != self.data_length as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Wrote {} sample bytes, header declares {}",
                    self.data_written, self.data_length
                ),
            ));
        }

        self.writer.flush()?;
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn stats(&self) -> WavWriterStats {
        WavWriterStats {
            data_written: self.data_written,
            data_length: self.data_length,
            header_written: self.header_written,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WavWriterStats {
    pub data_written: u64,
    pub data_length: u32,
    pub header_written: bool,
}

/// Writes `samples` (`sample_count` frames of interleaved little-endian
/// samples) to `path` as a WAV file, replacing any existing file. Returns the
/// total number of bytes written.
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[u8],
    sample_count: u64,
    channels: u16,
    sample_rate: u32,
    format: SampleFormat,
) -> io::Result<u64> {
    let spec = WavSpec {
        channels,
        sample_rate,
        format,
    };
    write_wav_file(path.as_ref(), samples, sample_count, spec, true)
}

pub(crate) fn write_wav_file(
    path: &Path,
    samples: &[u8],
    sample_count: u64,
    spec: WavSpec,
    overwrite: bool,
) -> io::Result<u64> {
    let data_length = spec.data_length(sample_count)?;
    if samples.len() as u64 != data_length as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Payload is {} bytes, {} frames of {} channels need {}",
                samples.len(),
                sample_count,
                spec.channels,
                data_length
            ),
        ));
    }

    let file = if overwrite {
        File::create(path)?
    } else {
        OpenOptions::new().write(true).create_new(true).open(path)?
    };

    let result = write_to(file, samples, sample_count, spec);
    if result.is_err() {
        // the header may already claim more than is on disk
        if let Err(e) = fs::remove_file(path) {
            debug!("Could not remove partial file {}: {e}", path.display());
        }
    }

    result
}

fn write_to(file: File, samples: &[u8], sample_count: u64, spec: WavSpec) -> io::Result<u64> {
    let mut writer = WavWriter::new(file, spec, sample_count)?;
    writer.write_header()?;
    writer.write_samples(samples)?;

    let written = WAV_HEADER_LEN + writer.stats().data_written;
    writer.finish()?.sync_all()?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn header_layout_int16() -> io::Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            format: SampleFormat::Int16,
        };
        let mut writer = WavWriter::new(Vec::new(), spec, 3)?;
        writer.write_header()?;
        writer.write_samples(&[1, 0, 2, 0, 3, 0])?;
        let bytes = writer.finish()?;

        assert_eq!(bytes.len(), 50);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 42);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), WAV_FORMAT_PCM);
        assert_eq!(u16_at(&bytes, 22), 1);
        assert_eq!(u32_at(&bytes, 24), 8000);
        assert_eq!(u32_at(&bytes, 28), 16000);
        assert_eq!(u16_at(&bytes, 32), 2);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 6);
        assert_eq!(&bytes[44..], &[1, 0, 2, 0, 3, 0]);
        Ok(())
    }

    #[test]
    fn float32_stereo_file() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("slice.wav");
        let samples = vec![0u8; 100 * 2 * 4];

        let written = write_wav(&path, &samples, 100, 2, 44100, SampleFormat::Float32)?;
        let bytes = fs::read(&path)?;

        assert_eq!(written, 844);
        assert_eq!(bytes.len(), 844);
        assert_eq!(u16_at(&bytes, 20), 3);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 28), 352800);
        assert_eq!(u16_at(&bytes, 32), 8);
        assert_eq!(u16_at(&bytes, 34), 32);
        assert_eq!(u32_at(&bytes, 40), 800);
        assert_eq!(u32_at(&bytes, 4), 836);
        Ok(())
    }

    #[test]
    fn payload_mismatch_is_rejected() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("short.wav");

        let err = write_wav(&path, &[0u8; 6], 4, 1, 8000, SampleFormat::Int16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!path.exists());

        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            format: SampleFormat::Int16,
        };
        let mut writer = WavWriter::new(Vec::new(), spec, 2)?;
        writer.write_header()?;
        writer.write_samples(&[0, 0])?;
        assert!(writer.write_samples(&[0, 0, 0, 0]).is_err());
        assert!(writer.finish().is_err());
        Ok(())
    }

    #[test]
    fn oversized_data_length() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            format: SampleFormat::Float32,
        };
        let max_frames = (u32::MAX - RIFF_OVERHEAD) as u64 / 8;
        assert!(spec.data_length(max_frames).is_ok());
        assert!(spec.data_length(max_frames + 1).is_err());
        assert!(spec.data_length(u64::MAX).is_err());
    }

    #[test]
    fn no_overwrite_keeps_existing_file() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("taken.wav");
        fs::write(&path, b"keep")?;

        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            format: SampleFormat::Int16,
        };
        let err = write_wav_file(&path, &[0, 0], 1, spec, false).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path)?, b"keep");
        Ok(())
    }
}
