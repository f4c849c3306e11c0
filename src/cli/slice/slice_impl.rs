use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use wavslice::process::decode::{DecodeStatus, DecodedStream, Decoder};
use wavslice::process::parse::parse;
use wavslice::process::wav_input::read_wav;
use wavslice::process::write::SliceWriter;
use wavslice::structs::audio_buffer::SampleFormat;
use wavslice::structs::slice_request::SliceRequest;
use wavslice::utils::errors::DecodeError;

use super::progress::{create_decode_bar, create_write_bar, finish_decode_bar, finish_write_bar};
use super::report::{RunReport, SliceReport};
use crate::cli::command::Cli;
use crate::input::{InputKind, InputReader};
use crate::timestamp::time_str;

/// What a run produced, used to pick the exit status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SliceRun {
    pub decode_failed: bool,
    pub requested: usize,
    pub written: usize,
    pub not_written: usize,
}

impl SliceRun {
    pub fn is_clean(&self) -> bool {
        !self.decode_failed && self.not_written == 0
    }
}

pub fn cmd_slice(cli: &Cli, multi: Option<&MultiProgress>) -> Result<SliceRun> {
    let format = SampleFormat::from(cli.format);

    log::info!(
        "Slicing {} (strict mode: {}, format: {format})",
        cli.input.display(),
        cli.strict
    );

    if !cli.dry_run {
        prepare_output_dir(&cli.output_dir)?;
    }

    let stream = decode_input(cli, format, multi)?;
    let duration = stream.audio.duration_secs();

    let input_name = cli.input.to_string_lossy();
    let requests = parse(&cli.outputs, &cli.starts, &cli.ends, &input_name, duration);
    log::info!("{} slice(s) requested", requests.len());

    let writer = SliceWriter::new(&cli.output_dir).overwrite(!cli.no_overwrite);

    let mut run = SliceRun {
        decode_failed: matches!(stream.status, DecodeStatus::Failed(_)),
        requested: requests.len(),
        ..Default::default()
    };

    let slices = if cli.dry_run {
        print_plan(&writer, &requests, multi);
        requests
            .iter()
            .map(|request| SliceReport::planned(request, &writer.path_for(request)))
            .collect()
    } else {
        write_slices(&writer, &stream, &requests, multi, &mut run)?
    };

    if let Some(ref path) = cli.report {
        RunReport::new(&cli.input, &stream, slices).write(path)?;
    }

    Ok(run)
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        anyhow::bail!("Output path {} is not a directory", dir.display());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn decode_input(
    cli: &Cli,
    format: SampleFormat,
    multi: Option<&MultiProgress>,
) -> Result<DecodedStream> {
    let start_time = Instant::now();

    let data = match InputReader::new(&cli.input).and_then(|mut reader| reader.read_all()) {
        Ok(data) => data,
        Err(e) => {
            log::error!("Failed to read {}: {e}", cli.input.display());
            return Ok(DecodedStream::failed(format, DecodeError::Io(e)));
        }
    };

    let pb = match multi {
        Some(multi) => Some(create_decode_bar(multi, data.len() as u64)?),
        None => None,
    };

    let stream = match InputKind::sniff(&data) {
        InputKind::Wav => {
            log::debug!("Input detected as WAV");
            drop(data);
            read_wav(&cli.input, format)
        }
        InputKind::Mp3 => {
            log::debug!("Input detected as MP3");
            let mut decoder = Decoder::new(format);
            decoder.set_fail_level(cli.fail_level());
            decoder.decode_with_progress(&data, |consumed| {
                if let Some(ref pb) = pb {
                    pb.set_position(consumed as u64);
                }
            })
        }
    };

    let duration = stream.audio.duration_secs();
    if let Some(ref pb) = pb {
        finish_decode_bar(pb, duration, start_time.elapsed());
    }

    let audio = &stream.audio;
    match stream.status {
        DecodeStatus::Failed(ref e) => log::error!(
            "Decoding failed after {}: {e}",
            time_str(duration)
        ),
        _ => log::info!(
            "Decoded {} of audio ({} Hz, {} channel(s), {} frame(s), {}) in {:.3}s",
            time_str(duration),
            audio.sample_rate(),
            audio.channels(),
            stream.frames,
            stream.status,
            start_time.elapsed().as_secs_f64()
        ),
    }

    if audio.is_empty() {
        log::warn!("No audio decoded from {}", cli.input.display());
    }

    Ok(stream)
}

fn write_slices(
    writer: &SliceWriter,
    stream: &DecodedStream,
    requests: &[SliceRequest],
    multi: Option<&MultiProgress>,
    run: &mut SliceRun,
) -> Result<Vec<SliceReport>> {
    let pb = match multi {
        Some(multi) => Some(create_write_bar(multi, requests.len())?),
        None => None,
    };

    let outcomes = writer.write_all_with_progress(&stream.audio, requests, |_| {
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    });

    run.written = outcomes.iter().filter(|o| o.is_written()).count();
    run.not_written = outcomes.len() - run.written;

    if let Some(ref pb) = pb {
        finish_write_bar(pb, run.written, run.not_written);
    }

    log::info!(
        "{} of {} slice(s) written to {}",
        run.written,
        requests.len(),
        writer.output_dir().display()
    );

    Ok(requests
        .iter()
        .zip(&outcomes)
        .map(|(request, outcome)| SliceReport::from_outcome(request, outcome))
        .collect())
}

fn print_plan(writer: &SliceWriter, requests: &[SliceRequest], multi: Option<&MultiProgress>) {
    let print = || {
        for request in requests {
            println!(
                "{:<32} {} - {} ({:.3}s)  {}",
                request.output_name,
                time_str(request.start_s.max(0.0)),
                time_str(request.end_s.max(0.0)),
                request.duration_s(),
                writer.path_for(request).display()
            );
        }
    };

    match multi {
        Some(multi) => multi.suspend(print),
        None => print(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_runs() {
        let run = SliceRun {
            requested: 3,
            written: 3,
            ..Default::default()
        };
        assert!(run.is_clean());

        let skipped = SliceRun {
            not_written: 1,
            ..run
        };
        assert!(!skipped.is_clean());

        let failed_decode = SliceRun {
            decode_failed: true,
            ..run
        };
        assert!(!failed_decode.is_clean());
    }

    #[test]
    fn output_dir_must_be_a_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("file");
        fs::write(&file, b"x")?;

        assert!(prepare_output_dir(&file).is_err());

        let nested = dir.path().join("a/b");
        prepare_output_dir(&nested)?;
        assert!(nested.is_dir());
        Ok(())
    }
}
