use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, LogFormat, MODES_HELP};
use cli::slice::cmd_slice;

mod cli;
mod input;
pub(crate) mod timestamp;

fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout with a zero exit
            if !e.use_stderr() {
                e.exit();
            }
            e.print()?;
            eprintln!("\n{MODES_HELP}");
            return Ok(ExitCode::from(e.exit_code().clamp(1, 255) as u8));
        }
    };

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"msg\":{:?}}}",
                    buf.timestamp(),
                    record.level(),
                    record.args().to_string()
                )
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    let run = cmd_slice(&cli, pb)?;

    if cli.strict && !run.is_clean() {
        log::error!(
            "Strict mode: {} of {} slice(s) not written{}",
            run.not_written,
            run.requested,
            if run.decode_failed { ", decoding failed" } else { "" }
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
