use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::timestamp::time_str;

const DECODE_TEMPLATE: &str =
    "{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}";
const WRITE_TEMPLATE: &str =
    "{bar:40.green/white} {pos}/{len} slices\n{msg} | elapsed: {elapsed_precise}";

/// Byte-position bar for the decode pass over an input of `total_bytes`.
pub fn create_decode_bar(multi: &MultiProgress, total_bytes: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total_bytes));
    pb.set_style(ProgressStyle::with_template(DECODE_TEMPLATE)?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("decoding");
    Ok(pb)
}

pub fn create_write_bar(multi: &MultiProgress, slices: usize) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(slices as u64));
    pb.set_style(ProgressStyle::with_template(WRITE_TEMPLATE)?);
    pb.set_message("writing slices");
    Ok(pb)
}

pub fn finish_decode_bar(pb: &ProgressBar, duration_secs: f64, elapsed: std::time::Duration) {
    pb.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    pb.finish_with_message(format!(
        "speed: {:.1}x | decoded: {}",
        realtime_multiplier(duration_secs, elapsed),
        time_str(duration_secs)
    ));
}

pub fn finish_write_bar(pb: &ProgressBar, written: usize, failed: usize) {
    pb.finish_with_message(format!("written: {written} | not written: {failed}"));
}

fn realtime_multiplier(duration_secs: f64, elapsed: std::time::Duration) -> f64 {
    let elapsed = elapsed.as_secs_f64();
    if elapsed > 0.0 {
        duration_secs / elapsed
    } else {
        0.0
    }
}
