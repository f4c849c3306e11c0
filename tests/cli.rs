use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use wavslice::structs::audio_buffer::SampleFormat;
use wavslice::utils::wav::write_wav;

fn wavsliced(args: &[&str]) -> io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_wavsliced"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
}

/// One second of 8 kHz mono ramp.
fn ramp_wav(path: &Path) -> io::Result<Vec<u8>> {
    let samples: Vec<u8> = (0..8000i16).flat_map(|i| i.to_le_bytes()).collect();
    write_wav(path, &samples, 8000, 1, 8000, SampleFormat::Int16)?;
    Ok(samples)
}

#[test]
fn wrong_arity_is_a_usage_error() -> io::Result<()> {
    let output = wavsliced(&["in.mp3", "auto", "30"])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Fixed-length"));
    Ok(())
}

#[test]
fn help_lists_modes() -> io::Result<()> {
    let output = wavsliced(&["--help"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Auto-timed"));
    Ok(())
}

#[test]
fn slices_a_wav_file() -> io::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("ramp.wav");
    let samples = ramp_wav(&input)?;
    let out = dir.path().join("out");
    let report = dir.path().join("report.yaml");

    let output = wavsliced(&[
        "--loglevel",
        "off",
        "--output-dir",
        &out.to_string_lossy(),
        "--report",
        &report.to_string_lossy(),
        &input.to_string_lossy(),
        "first,second,late",
        "0,0.25,0.5",
        "0.25,0.5,2",
    ])?;
    assert!(output.status.success());

    let second = fs::read(out.join("second.wav"))?;
    assert_eq!(second.len(), 44 + 2000 * 2);
    assert_eq!(&second[44..], &samples[4000..8000]);
    assert!(out.join("first.wav").exists());
    assert!(!out.join("late.wav").exists());

    let yaml = fs::read_to_string(&report)?;
    assert!(yaml.contains("sample_rate: 8000"));
    assert!(yaml.contains("status: skipped"));
    Ok(())
}

#[test]
fn strict_mode_fails_on_skipped_slices() -> io::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("ramp.wav");
    ramp_wav(&input)?;

    let output = wavsliced(&[
        "--loglevel",
        "off",
        "--strict",
        "--output-dir",
        &dir.path().to_string_lossy(),
        &input.to_string_lossy(),
        "auto",
        "0,0.5",
        "0.5,5",
    ])?;

    assert!(!output.status.success());
    assert!(dir.path().join("ramp_1.wav").exists());
    assert!(!dir.path().join("ramp_2.wav").exists());
    Ok(())
}

#[test]
fn dry_run_writes_nothing() -> io::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("ramp.wav");
    ramp_wav(&input)?;
    let out = dir.path().join("out");

    let output = wavsliced(&[
        "--loglevel",
        "off",
        "--dry-run",
        "--output-dir",
        &out.to_string_lossy(),
        &input.to_string_lossy(),
        "auto",
        "1",
        "-",
    ])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ramp_part_1"));
    assert!(!out.exists());
    Ok(())
}
