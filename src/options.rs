//! Command line options.
//!
//! `-h` wins over everything else on the command line, including invalid
//! options, so it is detected before clap sees the arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::{info, warn};

/// Highest verbosity reachable with repeated `-v`.
pub const MAX_VERBOSITY: u8 = 9;

const EXIT_CODES: &str = "\
Exit codes:
   0  trim wheel axis is nonzero
   1  trim wheel axis is zero
   4  this help
   8  command line or configuration error
  12  input subsystem unavailable
  16  trim wheel not found (default VID 0x06A3, PID 0x0BD4)";

#[derive(Parser, Debug)]
#[command(
    name = "trimwheel-check",
    version,
    about = "Checks whether the Saitek Pro Flight trim wheel axis has left zero",
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = EXIT_CODES
)]
struct CliArgs {
    /// Print this help
    #[arg(short = 'h', action = ArgAction::Help)]
    help: Option<bool>,

    /// Debug messages, level increased by multiple occurrences (max. 9)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Suppress per-cycle console output
    #[arg(short = 's')]
    silent: bool,

    /// Loop count in poll cycles (one second each without -v), accepted
    /// from 1 up to the configured cap
    #[arg(short = 'c', value_name = "N", allow_negative_numbers = true)]
    cycles: Option<String>,

    /// Report all connected controllers, not only the trim wheel
    #[arg(short = 'a')]
    all: bool,

    /// Configuration file
    #[arg(short = 'f', value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(value_name = "ARGS", hide = true)]
    extra: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub verbosity: u8,
    pub silent: bool,
    /// Requested loop cap as typed, validated against the configured cap later.
    pub cycles: Option<String>,
    pub report_all: bool,
    pub config_path: Option<PathBuf>,
    /// Non-option arguments, accepted and otherwise ignored.
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Usage text to print before exiting.
    Help(String),
    Run(RunOptions),
}

#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),
}

pub fn usage() -> String {
    CliArgs::command().render_help().to_string()
}

pub fn parse_args<I, T>(args: I) -> Result<Invocation, OptionError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if requests_help(&args) {
        return Ok(Invocation::Help(usage()));
    }

    let cli = match CliArgs::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => {
            return Ok(Invocation::Help(usage()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Invocation::Run(RunOptions {
        verbosity: cli.verbose.min(MAX_VERBOSITY),
        silent: cli.silent,
        cycles: cli.cycles,
        report_all: cli.all,
        config_path: cli.config,
        extra_args: cli.extra,
    }))
}

// Walks short-option clusters the way getopt does, skipping option values.
fn requests_help(args: &[OsString]) -> bool {
    let mut skip_value = false;
    for arg in args.iter().skip(1) {
        if skip_value {
            skip_value = false;
            continue;
        }
        let arg = arg.to_string_lossy();
        if arg == "--" {
            return false;
        }
        if arg == "--help" {
            return true;
        }
        let Some(cluster) = arg.strip_prefix('-') else {
            continue;
        };
        if cluster.starts_with('-') {
            continue;
        }
        for (position, flag) in cluster.char_indices() {
            match flag {
                'h' => return true,
                'c' | 'f' => {
                    skip_value = position + flag.len_utf8() == cluster.len();
                    break;
                }
                _ => {}
            }
        }
    }
    false
}

/// Applies `-c N` to the configured cap: accepted only for `0 < N <= cap`.
///
/// Anything else, including text that is not a number, keeps the cap.
pub fn resolve_loop_cap(requested: Option<&str>, cap: u32) -> u32 {
    let Some(requested) = requested else {
        return cap;
    };
    match requested.trim().parse::<u32>() {
        Ok(cycles) if cycles > 0 && cycles <= cap => {
            info!("Loop count set to {} cycles", cycles);
            cycles
        }
        _ => {
            warn!(
                "Loop count {:?} ignored, must be between 1 and {}; keeping {}",
                requested, cap, cap
            );
            cap
        }
    }
}
