use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wavslice::process::decode::DecodedStream;
use wavslice::process::write::SliceOutcome;
use wavslice::structs::slice_request::SliceRequest;

/// YAML summary of one run, written with `--report`.
#[derive(Debug, Deserialize, Serialize)]
pub struct RunReport {
    pub input: String,
    pub format: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_s: f64,
    pub decode_status: String,
    pub frames_decoded: usize,
    pub creation_tool: String,
    pub creation_tool_version: String,
    pub slices: Vec<SliceReport>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SliceReport {
    pub name: String,
    pub start_s: f64,
    pub end_s: f64,
    pub path: String,
    pub status: SliceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceStatus {
    Written,
    Skipped,
    Failed,
    /// Dry run, nothing was attempted.
    Planned,
}

impl SliceReport {
    pub fn from_outcome(request: &SliceRequest, outcome: &SliceOutcome) -> Self {
        let (status, bytes_written, error) = match &outcome.result {
            Ok(written) => (SliceStatus::Written, Some(written.bytes_written), None),
            Err(e) if e.is_validation() => (SliceStatus::Skipped, None, Some(e.to_string())),
            Err(e) => (SliceStatus::Failed, None, Some(e.to_string())),
        };

        Self {
            name: outcome.output_name.clone(),
            start_s: request.start_s,
            end_s: request.end_s,
            path: outcome.path.display().to_string(),
            status,
            bytes_written,
            error,
        }
    }

    pub fn planned(request: &SliceRequest, path: &Path) -> Self {
        Self {
            name: request.output_name.clone(),
            start_s: request.start_s,
            end_s: request.end_s,
            path: path.display().to_string(),
            status: SliceStatus::Planned,
            bytes_written: None,
            error: None,
        }
    }
}

impl RunReport {
    pub fn new(input: &Path, stream: &DecodedStream, slices: Vec<SliceReport>) -> Self {
        let audio = &stream.audio;

        Self {
            input: input.display().to_string(),
            format: audio.format().to_string(),
            sample_rate: audio.sample_rate(),
            channels: audio.channels(),
            duration_s: audio.duration_secs(),
            decode_status: stream.status.to_string(),
            frames_decoded: stream.frames,
            creation_tool: env!("CARGO_PKG_NAME").to_string(),
            creation_tool_version: env!("CARGO_PKG_VERSION").to_string(),
            slices,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).context("Failed to serialize run report")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write run report {}", path.display()))?;

        log::info!("Run report written to {}", path.display());
        Ok(())
    }
}
