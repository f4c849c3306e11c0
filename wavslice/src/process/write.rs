use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use log::{error, info, warn};

use crate::process::slice::extract;
use crate::structs::audio_buffer::AudioBuffer;
use crate::structs::slice_request::SliceRequest;
use crate::utils::errors::SliceError;
use crate::utils::wav::{WavSpec, write_wav_file};

pub const OUTPUT_EXTENSION: &str = "wav";

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenSlice {
    pub bytes_written: u64,
    /// Samples per channel.
    pub frames: u64,
    pub duration_s: f64,
}

/// What happened to one request, reported in request order.
#[derive(Debug)]
pub struct SliceOutcome {
    pub index: usize,
    pub output_name: String,
    pub path: PathBuf,
    pub result: Result<WrittenSlice, SliceError>,
}

impl SliceOutcome {
    pub fn is_written(&self) -> bool {
        self.result.is_ok()
    }
}

/// Writes every slice request as its own WAV file, one worker thread per
/// request.
///
/// Workers only borrow the shared [`AudioBuffer`]; each extracts and writes
/// its own slice, so a failure in one never affects another. All workers are
/// joined before [`write_all`](SliceWriter::write_all) returns.
///
/// ```rust,no_run
/// use wavslice::process::write::SliceWriter;
/// use wavslice::structs::audio_buffer::AudioBuffer;
/// use wavslice::structs::slice_request::SliceRequest;
///
/// let audio = AudioBuffer::from_i16(8000, 1, &[0; 16000]);
/// let requests = [SliceRequest::new(0.0, 1.0, "first"), SliceRequest::new(1.0, 2.0, "second")];
///
/// for outcome in SliceWriter::new("out").write_all(&audio, &requests) {
///     println!("{}: {:?}", outcome.path.display(), outcome.result);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SliceWriter {
    output_dir: PathBuf,
    overwrite: bool,
}

impl SliceWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite: true,
        }
    }

    /// When false, an existing output file fails that slice instead of being
    /// replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, request: &SliceRequest) -> PathBuf {
        self.output_dir
            .join(format!("{}.{OUTPUT_EXTENSION}", request.output_name))
    }

    pub fn write_all(&self, buffer: &AudioBuffer, requests: &[SliceRequest]) -> Vec<SliceOutcome> {
        self.write_all_with_progress(buffer, requests, |_| {})
    }

    /// Like [`write_all`](SliceWriter::write_all), calling `on_outcome` as each
    /// slice completes. Calls come from the worker threads in completion order.
    pub fn write_all_with_progress<F>(
        &self,
        buffer: &AudioBuffer,
        requests: &[SliceRequest],
        on_outcome: F,
    ) -> Vec<SliceOutcome>
    where
        F: Fn(&SliceOutcome) + Sync,
    {
        self.write_all_admitted(buffer, requests, on_outcome, |_| Ok(()))
    }

    /// Runs the workers, asking `admit` before each spawn. An error from
    /// `admit` is treated exactly like a failed thread spawn.
    fn write_all_admitted<F, A>(
        &self,
        buffer: &AudioBuffer,
        requests: &[SliceRequest],
        on_outcome: F,
        mut admit: A,
    ) -> Vec<SliceOutcome>
    where
        F: Fn(&SliceOutcome) + Sync,
        A: FnMut(usize) -> io::Result<()>,
    {
        let mut outcomes: Vec<Option<SliceOutcome>> = requests.iter().map(|_| None).collect();
        let on_outcome = &on_outcome;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(requests.len());
            let mut spawn_failed = false;

            for (index, request) in requests.iter().enumerate() {
                let path = self.path_for(request);

                if spawn_failed {
                    let outcome = self.finish(index, request, path, Err(SliceError::NotStarted));
                    on_outcome(&outcome);
                    outcomes[index] = Some(outcome);
                    continue;
                }

                let worker_path = path.clone();
                let spawned = admit(index).and_then(|()| {
                    thread::Builder::new()
                        .name(format!("slice-{index}"))
                        .spawn_scoped(scope, move || {
                            let result = self.write_one(buffer, request, &worker_path);
                            let outcome = self.finish(index, request, worker_path, result);
                            on_outcome(&outcome);
                            outcome
                        })
                });

                match spawned {
                    Ok(handle) => handles.push((index, request, path, handle)),
                    Err(e) => {
                        spawn_failed = true;
                        let result = Err(SliceError::Spawn(e));
                        let outcome = self.finish(index, request, path, result);
                        on_outcome(&outcome);
                        outcomes[index] = Some(outcome);
                    }
                }
            }

            for (index, request, path, handle) in handles {
                let outcome = handle.join().unwrap_or_else(|_| {
                    let result = Err(SliceError::WorkerPanicked);
                    let outcome = self.finish(index, request, path, result);
                    on_outcome(&outcome);
                    outcome
                });
                outcomes[index] = Some(outcome);
            }
        });

        outcomes.into_iter().flatten().collect()
    }

    fn write_one(
        &self,
        buffer: &AudioBuffer,
        request: &SliceRequest,
        path: &Path,
    ) -> Result<WrittenSlice, SliceError> {
        let slice = extract(buffer, request)?;
        let spec = WavSpec {
            channels: slice.channels.max(1),
            sample_rate: slice.sample_rate,
            format: slice.format,
        };

        let bytes_written = write_wav_file(path, &slice.data, slice.frames, spec, self.overwrite)?;

        Ok(WrittenSlice {
            bytes_written,
            frames: slice.frames,
            duration_s: slice.duration_secs(),
        })
    }

    fn finish(
        &self,
        index: usize,
        request: &SliceRequest,
        path: PathBuf,
        result: Result<WrittenSlice, SliceError>,
    ) -> SliceOutcome {
        match &result {
            Ok(written) => info!(
                "Wrote {} ({} bytes, {:.3}s)",
                path.display(),
                written.bytes_written,
                written.duration_s
            ),
            Err(e) if e.is_validation() => warn!("Skipped slice {request}: {e}"),
            Err(e) => error!("Slice {request} failed: {e}"),
        }

        SliceOutcome {
            index,
            output_name: request.output_name.clone(),
            path,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::utils::wav::WAV_HEADER_LEN;

    /// 100 Hz mono, 10 seconds, sample value = index.
    fn counting_buffer() -> AudioBuffer {
        let samples: Vec<i16> = (0..1000).collect();
        AudioBuffer::from_i16(100, 1, &samples)
    }

    #[test]
    fn ten_concurrent_slices() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let buffer = counting_buffer();
        let requests: Vec<_> = (0..10)
            .map(|i| SliceRequest::new(i as f64, i as f64 + 0.5, format!("s{i}")))
            .collect();

        let outcomes = SliceWriter::new(dir.path()).write_all(&buffer, &requests);

        assert_eq!(outcomes.len(), 10);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(outcome.output_name, format!("s{i}"));

            let written = outcome.result.as_ref().unwrap();
            assert_eq!(written.frames, 50);
            assert_eq!(written.bytes_written, WAV_HEADER_LEN + 100);

            let bytes = fs::read(&outcome.path)?;
            let offset = i * 100 * 2;
            assert_eq!(&bytes[44..], &buffer.as_bytes()[offset..offset + 100]);
        }
        Ok(())
    }

    #[test]
    fn invalid_request_does_not_stop_the_others() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let buffer = counting_buffer();
        let requests = [
            SliceRequest::new(0.0, 1.0, "ok_a"),
            SliceRequest::new(9.0, 11.0, "too_long"),
            SliceRequest::new(2.0, 1.0, "inverted"),
            SliceRequest::new(5.0, 10.0, "ok_b"),
        ];

        let outcomes = SliceWriter::new(dir.path()).write_all(&buffer, &requests);

        assert!(outcomes[0].is_written());
        assert!(matches!(
            outcomes[1].result,
            Err(SliceError::EndBeyondDuration { .. })
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(SliceError::InvertedRange { .. })
        ));
        assert!(outcomes[3].is_written());

        assert!(!dir.path().join("too_long.wav").exists());
        assert!(!dir.path().join("inverted.wav").exists());
        assert_eq!(fs::metadata(dir.path().join("ok_b.wav"))?.len(), 44 + 1000);
        Ok(())
    }

    #[test]
    fn no_overwrite() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("taken.wav"), b"old")?;
        let requests = [
            SliceRequest::new(0.0, 1.0, "taken"),
            SliceRequest::new(1.0, 2.0, "free"),
        ];

        let outcomes = SliceWriter::new(dir.path())
            .overwrite(false)
            .write_all(&counting_buffer(), &requests);

        match &outcomes[0].result {
            Err(SliceError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::AlreadyExists),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fs::read(dir.path().join("taken.wav"))?, b"old");
        assert!(outcomes[1].is_written());
        Ok(())
    }

    #[test]
    fn empty_buffer_skips_everything() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let buffer = AudioBuffer::empty(Default::default());
        let requests = [
            SliceRequest::new(0.0, 1.0, "a"),
            SliceRequest::new(1.0, 2.0, "b"),
        ];

        let outcomes = SliceWriter::new(dir.path()).write_all(&buffer, &requests);

        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o.result, Err(SliceError::EmptyBuffer)))
        );
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn spawn_failure_stops_later_slices() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let requests: Vec<_> = (0..5)
            .map(|i| SliceRequest::new(i as f64, i as f64 + 1.0, format!("w{i}")))
            .collect();
        let calls = AtomicUsize::new(0);

        let outcomes = SliceWriter::new(dir.path()).write_all_admitted(
            &counting_buffer(),
            &requests,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
            |index| match index {
                2 => Err(io::Error::new(io::ErrorKind::WouldBlock, "no threads left")),
                _ => Ok(()),
            },
        );

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[0].is_written());
        assert!(outcomes[1].is_written());
        assert!(matches!(outcomes[2].result, Err(SliceError::Spawn(_))));
        assert!(matches!(outcomes[3].result, Err(SliceError::NotStarted)));
        assert!(matches!(outcomes[4].result, Err(SliceError::NotStarted)));
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        assert!(dir.path().join("w0.wav").exists());
        assert!(dir.path().join("w1.wav").exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 2);
        Ok(())
    }

    #[test]
    fn progress_and_panics() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let requests: Vec<_> = (0..4)
            .map(|i| SliceRequest::new(i as f64, i as f64 + 1.0, format!("p{i}")))
            .collect();
        let calls = AtomicUsize::new(0);

        let outcomes = SliceWriter::new(dir.path()).write_all_with_progress(
            &counting_buffer(),
            &requests,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if thread::current().name() == Some("slice-2") {
                    panic!("progress sink failed");
                }
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(matches!(outcomes[2].result, Err(SliceError::WorkerPanicked)));
        assert_eq!(outcomes.iter().filter(|o| o.is_written()).count(), 3);
        Ok(())
    }
}
