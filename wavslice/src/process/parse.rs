use std::path::Path;

use log::{debug, warn};

use crate::process::MAX_SLICES;
use crate::structs::slice_request::{SliceAddressingMode, SliceRequest};

/// Outputs token selecting derived names instead of explicit ones.
pub const AUTO_SENTINEL: &str = "auto";

pub const DELIMITER: char = ',';

/// Name stem used when the input path has no file name.
const FALLBACK_STEM: &str = "slice";

/// Turns the three textual lists into an ordered list of slice requests.
///
/// `input_name` is only used to derive names in the auto modes, and
/// `buffer_duration_s` only to walk the buffer in fixed-length mode. Malformed
/// input never fails: numbers parse leniently, the shortest list wins and
/// anything beyond [`MAX_SLICES`] is dropped.
///
/// ```rust
/// use wavslice::process::parse::parse;
///
/// let requests = parse("auto", "4", "", "music/take.mp3", 10.0);
/// let names: Vec<_> = requests.iter().map(|r| r.output_name.as_str()).collect();
/// assert_eq!(names, ["take_part_1", "take_part_2", "take_part_3"]);
/// assert_eq!(requests[2].end_s, 10.0);
/// ```
pub fn parse(
    outputs_spec: &str,
    starts_spec: &str,
    ends_spec: &str,
    input_name: &str,
    buffer_duration_s: f64,
) -> Vec<SliceRequest> {
    let mode = resolve_mode(outputs_spec, starts_spec, ends_spec);
    debug!("Slice addressing mode: {mode:?}");

    generate(&mode, input_name, buffer_duration_s)
}

/// Picks the addressing mode from the raw tokens.
pub fn resolve_mode(
    outputs_spec: &str,
    starts_spec: &str,
    ends_spec: &str,
) -> SliceAddressingMode {
    let starts = || -> Vec<f64> { tokens(starts_spec).map(parse_number).collect() };
    let ends = || -> Vec<f64> { tokens(ends_spec).map(parse_number).collect() };

    if outputs_spec != AUTO_SENTINEL {
        return SliceAddressingMode::Explicit {
            names: tokens(outputs_spec).map(str::to_string).collect(),
            starts: starts(),
            ends: ends(),
        };
    }

    if is_plain_number(starts_spec) {
        SliceAddressingMode::FixedLength {
            segment_length_s: parse_number(starts_spec),
        }
    } else {
        SliceAddressingMode::AutoTimed {
            starts: starts(),
            ends: ends(),
        }
    }
}

pub fn generate(
    mode: &SliceAddressingMode,
    input_name: &str,
    buffer_duration_s: f64,
) -> Vec<SliceRequest> {
    match mode {
        SliceAddressingMode::Explicit {
            names,
            starts,
            ends,
        } => {
            log_length_mismatch(&[names.len(), starts.len(), ends.len()]);

            let requests = names
                .iter()
                .zip(starts)
                .zip(ends)
                .map(|((name, start), end)| SliceRequest::new(*start, *end, name.as_str()));
            cap(requests, names.len().min(starts.len()).min(ends.len()))
        }
        SliceAddressingMode::AutoTimed { starts, ends } => {
            log_length_mismatch(&[starts.len(), ends.len()]);

            let stem = file_stem(input_name);
            let requests = starts
                .iter()
                .zip(ends)
                .enumerate()
                .map(|(i, (start, end))| {
                    SliceRequest::new(*start, *end, format!("{stem}_{}", i + 1))
                });
            cap(requests, starts.len().min(ends.len()))
        }
        SliceAddressingMode::FixedLength { segment_length_s } => {
            fixed_length(*segment_length_s, input_name, buffer_duration_s)
        }
    }
}

fn fixed_length(length: f64, input_name: &str, duration: f64) -> Vec<SliceRequest> {
    if !length.is_finite() || length <= 0.0 {
        warn!("Segment length {length}s produces no slices");
        return Vec::new();
    }

    let mut bounds = Vec::new();
    let mut index = 0usize;
    loop {
        // multiplying avoids the drift of repeated addition
        let start = index as f64 * length;
        if duration.is_nan() || start >= duration {
            break;
        }
        if bounds.len() == MAX_SLICES {
            debug!("Fixed-length split truncated at {MAX_SLICES} slices");
            break;
        }
        bounds.push((start, (start + length).min(duration)));
        index += 1;
    }

    let stem = file_stem(input_name);
    let width = bounds.len().to_string().len();

    bounds
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            SliceRequest::new(start, end, format!("{stem}_part_{:0width$}", i + 1))
        })
        .collect()
}

fn cap<I: Iterator<Item = SliceRequest>>(requests: I, available: usize) -> Vec<SliceRequest> {
    if available > MAX_SLICES {
        debug!("{available} slices requested, keeping the first {MAX_SLICES}");
    }
    requests.take(MAX_SLICES).collect()
}

fn log_length_mismatch(lens: &[usize]) {
    if lens.windows(2).any(|w| w[0] != w[1]) {
        debug!("Slice lists have different lengths {lens:?}, using the shortest");
    }
}

/// Splits on the delimiter, dropping empty tokens. Tokens are not trimmed.
pub fn tokens(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(DELIMITER).filter(|token| !token.is_empty())
}

/// Digits only, with no sign, point or delimiter.
fn is_plain_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parses the longest numeric prefix of `token` after leading whitespace,
/// giving 0 when there is none.
pub fn parse_number(token: &str) -> f64 {
    let token = token.trim_start();
    let bytes = token.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_from(sign);
    let mut mantissa_digits = end - sign;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + exp_sign);
        if exp_end > end + 1 + exp_sign {
            end = exp_end;
        }
    }

    token[..end].parse().unwrap_or(0.0)
}

/// File name of `input_name` without directory and extension.
pub fn file_stem(input_name: &str) -> String {
    Path::new(input_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}
