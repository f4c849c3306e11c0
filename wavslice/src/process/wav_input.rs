use std::fs::File;
use std::io;
use std::path::Path;

use log::{debug, error, info, warn};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::process::decode::{DecodeStatus, DecodedStream, PartialReason, interleaved_bytes};
use crate::structs::audio_buffer::{AudioBuffer, SampleFormat};
use crate::utils::errors::DecodeError;

/// Decodes a WAV file into an [`AudioBuffer`] of `format`.
///
/// Open and probe failures give an empty buffer with a failed status. A
/// packet that cannot be read or decoded ends decoding with whatever was
/// decoded so far.
pub fn read_wav<P: AsRef<Path>>(path: P, format: SampleFormat) -> DecodedStream {
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {e}", path.display());
            return DecodedStream::failed(format, DecodeError::Io(e));
        }
    };
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = match get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => probed,
        Err(e) => {
            error!("Failed to probe {}: {e}", path.display());
            return DecodedStream::failed(format, DecodeError::Codec(e));
        }
    };
    let mut reader = probed.format;

    let Some(track) = reader
        .default_track()
        .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
    else {
        error!("{} has no decodable audio track", path.display());
        return DecodedStream::failed(format, DecodeError::NoTrack);
    };
    let track_id = track.id;

    let mut decoder = match get_codecs().make(&track.codec_params, &DecoderOptions::default()) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("Unsupported codec in {}: {e}", path.display());
            return DecodedStream::failed(format, DecodeError::Codec(e));
        }
    };

    let mut pcm = Vec::new();
    let mut channels = track
        .codec_params
        .channels
        .map_or(0, |c| c.count() as u16);
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut status = DecodeStatus::Complete;
    let mut packets = 0usize;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                warn!("Stopping WAV read after {packets} packets: {e}");
                status = DecodeStatus::Partial(PartialReason::TruncatedFrame);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if decoded.frames() == 0 {
                    continue;
                }
                channels = decoded.spec().channels.count() as u16;
                sample_rate = decoded.spec().rate;
                pcm.extend(interleaved_bytes(decoded, format));
                packets += 1;
            }
            Err(e) => {
                warn!("Stopping WAV read after {packets} packets: {e}");
                status = DecodeStatus::Partial(PartialReason::TruncatedFrame);
                break;
            }
        }
    }
    debug!("Read {packets} packets from {}", path.display());

    if pcm.is_empty() {
        channels = 0;
        sample_rate = 0;
    }

    let audio = AudioBuffer::new(sample_rate, channels, format, pcm);
    info!(
        "Read WAV: {} Hz, {} channels, {:.3}s ({status})",
        audio.sample_rate(),
        audio.channels(),
        audio.duration_secs()
    );

    DecodedStream {
        audio,
        status,
        frames: packets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::wav::write_wav;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len as i16)
            .flat_map(|s| (s * 16 - 4000).to_le_bytes())
            .collect()
    }

    #[test]
    fn reads_back_written_pcm() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ramp.wav");
        let samples = ramp(1600);
        write_wav(&path, &samples, 800, 2, 8000, SampleFormat::Int16)?;

        let stream = read_wav(&path, SampleFormat::Int16);

        assert!(stream.status.is_complete());
        assert_eq!(stream.audio.sample_rate(), 8000);
        assert_eq!(stream.audio.channels(), 2);
        assert_eq!(stream.audio.as_bytes(), &samples[..]);
        Ok(())
    }

    #[test]
    fn converts_to_float() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ramp.wav");
        write_wav(&path, &ramp(400), 400, 1, 16000, SampleFormat::Int16)?;

        let stream = read_wav(&path, SampleFormat::Float32);

        assert_eq!(stream.audio.format(), SampleFormat::Float32);
        assert_eq!(stream.audio.num_samples(), 400);
        assert_eq!(stream.audio.as_bytes().len(), 1600);
        assert_eq!(stream.audio.duration_secs(), 0.025);
        Ok(())
    }

    #[test]
    fn open_and_probe_failures() -> io::Result<()> {
        let stream = read_wav("/nonexistent/input.wav", SampleFormat::Int16);
        assert!(matches!(stream.status, DecodeStatus::Failed(DecodeError::Io(_))));
        assert!(stream.audio.is_empty());

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, [0x13u8; 256])?;

        let stream = read_wav(&path, SampleFormat::Int16);
        assert!(matches!(stream.status, DecodeStatus::Failed(_)));
        assert!(stream.audio.is_empty());
        Ok(())
    }
}
