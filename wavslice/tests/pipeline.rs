use std::fs;
use std::io;

use wavslice::process::decode::{DecodeStatus, Decoder, PartialReason};
use wavslice::process::parse::parse;
use wavslice::process::wav_input::read_wav;
use wavslice::process::write::SliceWriter;
use wavslice::structs::audio_buffer::SampleFormat;
use wavslice::utils::errors::SliceError;
use wavslice::utils::wav::write_wav;

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, stereo, unprotected.
const STEREO_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x04];
const FRAME_LEN: usize = 417;

/// Frames with zeroed side information, which decode to digital silence.
fn silent_mp3(frames: usize) -> Vec<u8> {
    let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x00".to_vec();
    for _ in 0..frames {
        let start = data.len();
        data.resize(start + FRAME_LEN, 0);
        data[start..start + 4].copy_from_slice(&STEREO_HEADER);
    }
    data
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
fn mp3_fixed_length_split() -> io::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("silence.mp3");
    fs::write(&input, silent_mp3(40))?;

    let mut decoder = Decoder::new(SampleFormat::Int16);
    let stream = decoder.decode_file(&input);

    assert!(stream.status.is_complete());
    assert_eq!(stream.frames, 40);
    assert_eq!(stream.audio.channels(), 2);
    assert_eq!(stream.audio.sample_rate(), 44100);
    assert_eq!(stream.audio.num_frames(), 40 * 1152);

    let duration = stream.audio.duration_secs();
    let requests = parse("auto", "0", "", "silence.mp3", duration);
    assert!(requests.is_empty());

    let requests = parse("auto", "1", "", "silence.mp3", duration);
    assert_eq!(requests.len(), duration.ceil() as usize);
    assert_eq!(requests.last().map(|r| r.end_s), Some(duration));

    let out = dir.path().join("out");
    fs::create_dir(&out)?;
    let outcomes = SliceWriter::new(&out).write_all(&stream.audio, &requests);

    assert!(outcomes.iter().all(|o| o.is_written()));
    let first = fs::read(out.join("silence_part_1.wav"))?;
    assert_eq!(first.len(), 44 + 44100 * 2 * 2);
    assert_eq!(u32_at(&first, 24), 44100);
    assert_eq!(u32_at(&first, 28), 44100 * 4);
    Ok(())
}

#[test]
fn mp3_truncated_tail_still_slices() -> io::Result<()> {
    let mut data = silent_mp3(10);
    data.truncate(data.len() - 100);

    let mut decoder = Decoder::new(SampleFormat::Float32);
    let stream = decoder.decode(&data);

    assert!(matches!(
        stream.status,
        DecodeStatus::Partial(PartialReason::TruncatedFrame)
    ));
    assert_eq!(stream.frames, 9);

    let dir = tempfile::tempdir()?;
    let duration = stream.audio.duration_secs();
    let requests = parse("head,tail", "0,0.1", "0.1,0.5", "cut.mp3", duration);
    let outcomes = SliceWriter::new(dir.path()).write_all(&stream.audio, &requests);

    assert_eq!(
        fs::metadata(dir.path().join("head.wav"))?.len(),
        44 + 4410 * 2 * 4
    );
    // 9 frames are about 0.235 s
    assert!(matches!(
        outcomes[1].result,
        Err(SliceError::EndBeyondDuration { .. })
    ));
    assert!(!dir.path().join("tail.wav").exists());
    Ok(())
}

#[test]
fn wav_input_explicit_slices() -> io::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("tone.wav");
    let samples: Vec<u8> = (0..16000i32)
        .flat_map(|i| ((i % 200 - 100) as i16 * 50).to_le_bytes())
        .collect();
    write_wav(&input, &samples, 16000, 1, 8000, SampleFormat::Int16)?;

    let stream = read_wav(&input, SampleFormat::Int16);
    assert!(stream.status.is_complete());
    assert_eq!(stream.audio.duration_secs(), 2.0);

    let requests = parse(
        "a,b,c",
        "0,0.5,1.5",
        "0.5,1.5,2",
        input.to_string_lossy().as_ref(),
        stream.audio.duration_secs(),
    );
    let outcomes = SliceWriter::new(dir.path()).write_all(&stream.audio, &requests);
    assert!(outcomes.iter().all(|o| o.is_written()));

    let b = fs::read(dir.path().join("b.wav"))?;
    assert_eq!(&b[44..], &samples[8000..24000]);
    Ok(())
}

#[test]
fn undecodable_input_writes_nothing() -> io::Result<()> {
    let dir = tempfile::tempdir()?;

    let mut decoder = Decoder::new(SampleFormat::Int16);
    let stream = decoder.decode(&[0x5A; 2048]);
    assert!(stream.audio.is_empty());

    // "0.0" is not digits only, so this is one auto-timed window
    let requests = parse("auto", "0.0", "1", "junk.bin", stream.audio.duration_secs());
    let outcomes = SliceWriter::new(dir.path()).write_all(&stream.audio, &requests);

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].result, Err(SliceError::EmptyBuffer)));
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}
