pub mod app;
pub mod config;
pub mod exit_code;
pub mod input;
pub mod monitor;
pub mod options;

use std::process::ExitCode;

use color_eyre::Result;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::exit_code::ExitStatus;
use crate::input::gilrs_backend::GilrsInput;
use crate::input::InputSubsystem;
use crate::monitor::{ConsoleKeys, ThreadPacer};
use crate::options::{Invocation, RunOptions};

fn main() -> ExitCode {
    if let Err(report) = setup() {
        eprintln!("{report:?}");
    }

    let options = match options::parse_args(std::env::args_os()) {
        Ok(Invocation::Help(usage)) => {
            println!("{usage}");
            return ExitStatus::HelpShown.into();
        }
        Ok(Invocation::Run(options)) => options,
        Err(e) => {
            eprint!("{e}");
            return ExitStatus::OptionError.into();
        }
    };

    setup_logging_env(options.verbosity);
    info!(
        "***** Running {} {} *****",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    if options.verbosity > 0 {
        info!("Verbosity increased to {}", options.verbosity);
    }

    match run(&options) {
        Ok(status) => {
            info!("End program, exit code {}", status.code());
            status.into()
        }
        Err(report) => {
            error!("{:?}", report);
            ExitStatus::InputUnavailable.into()
        }
    }
}

fn run(options: &RunOptions) -> Result<ExitStatus> {
    let keys = ConsoleKeys::spawn()?;
    Ok(app::execute(
        options,
        || GilrsInput::new().map(|input| Box::new(input) as Box<dyn InputSubsystem>),
        Box::new(keys),
        Box::new(ThreadPacer),
    ))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

fn setup_logging_env(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(verbosity > 0)
        .with_line_number(verbosity > 0)
        .init();
}
