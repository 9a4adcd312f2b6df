use tracing::{debug, error, info};

use crate::config::Config;
use crate::exit_code::ExitStatus;
use crate::input::{InputError, InputSubsystem};
use crate::monitor::{KeySource, MonitorSettings, Pacer, TrimwheelMonitor};
use crate::options::{resolve_loop_cap, RunOptions};

/// Combines the configuration file with the command line.
pub fn monitor_settings(config: &Config, options: &RunOptions) -> MonitorSettings {
    MonitorSettings {
        target: config.target.identity(),
        report_all: options.report_all,
        silent: options.silent,
        loop_cap: resolve_loop_cap(options.cycles.as_deref(), config.polling.max_cycles),
        poll_interval: config.poll_interval(options.verbosity > 0),
        exit_key: config.exit_key,
    }
}

/// Loads configuration, opens the input subsystem and runs the monitor to
/// completion.
pub fn execute<F>(
    options: &RunOptions,
    open_input: F,
    keys: Box<dyn KeySource>,
    pacer: Box<dyn Pacer>,
) -> ExitStatus
where
    F: FnOnce() -> Result<Box<dyn InputSubsystem>, InputError>,
{
    if !options.extra_args.is_empty() {
        debug!(
            "Unprocessed command line parameters ({}): {:?}",
            options.extra_args.len(),
            options.extra_args
        );
    }

    let config = match Config::load(options.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitStatus::OptionError;
        }
    };
    let settings = monitor_settings(&config, options);

    let input = match open_input() {
        Ok(input) => input,
        Err(e) => {
            error!("{}", e);
            return ExitStatus::InputUnavailable;
        }
    };

    let monitor = TrimwheelMonitor::create(input, keys, pacer, settings);
    let polling = match monitor.initialize() {
        Ok(polling) => polling,
        Err(e) => {
            error!("{}", e);
            return ExitStatus::InputUnavailable;
        }
    };

    let outcome = polling.run();
    info!(
        "Trim wheel check finished: {:?}, {} cycle(s) without the wheel",
        outcome.state, outcome.not_found_cycles
    );
    outcome.exit_status()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::input::fake::{FakeDevice, FakeInput};
    use crate::monitor::keys::scripted::ScriptedKeys;
    use crate::monitor::pacing::recording::RecordingPacer;
    use crate::monitor::TRIM_WHEEL;

    /// Config file inside a directory removed when the test ends.
    fn write_config(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), content).unwrap();
        dir
    }

    fn options(config: &TempDir, cycles: Option<&str>) -> RunOptions {
        RunOptions {
            verbosity: 0,
            silent: true,
            cycles: cycles.map(str::to_string),
            report_all: false,
            config_path: Some(config.path().join("config.toml")),
            extra_args: vec!["ignored".to_string()],
        }
    }

    fn execute_with(options: &RunOptions, input: FakeInput) -> (ExitStatus, Vec<Duration>) {
        let pacer = RecordingPacer::default();
        let pauses = pacer.pauses.clone();
        let status = execute(
            options,
            move || Ok(Box::new(input) as Box<dyn InputSubsystem>),
            Box::new(ScriptedKeys::none()),
            Box::new(pacer),
        );
        let pauses = pauses.borrow().clone();
        (status, pauses)
    }

    #[test]
    fn settings_merge_config_and_command_line() {
        let config = Config::default();
        let mut run = RunOptions {
            verbosity: 2,
            silent: false,
            cycles: Some("60".to_string()),
            report_all: true,
            config_path: None,
            extra_args: Vec::new(),
        };
        let settings = monitor_settings(&config, &run);
        assert_eq!(settings.loop_cap, 60);
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert!(settings.report_all);
        assert_eq!(settings.target, TRIM_WHEEL);

        run.cycles = Some("0".to_string());
        run.verbosity = 0;
        let settings = monitor_settings(&config, &run);
        assert_eq!(settings.loop_cap, config.polling.max_cycles);
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn turned_wheel_exits_zero() {
        let config = write_config("");
        let input = FakeInput::new().with_device(1, FakeDevice::new(TRIM_WHEEL, vec![0.0, 0.3]));

        let (status, pauses) = execute_with(&options(&config, Some("10")), input);

        assert_eq!(status, ExitStatus::WheelTurned);
        assert_eq!(pauses, vec![Duration::from_secs(1)]);
    }

    #[test]
    fn zero_wheel_runs_the_requested_cycles_and_exits_one() {
        let config = write_config("[polling]\ninterval_ms = 20\n");
        let input = FakeInput::new().with_device(1, FakeDevice::new(TRIM_WHEEL, vec![0.0]));

        let (status, pauses) = execute_with(&options(&config, Some("4")), input);

        assert_eq!(status, ExitStatus::WheelUntouched);
        assert_eq!(pauses, vec![Duration::from_millis(20); 4]);
    }

    #[test]
    fn configured_target_replaces_the_trim_wheel() {
        let config = write_config("[target]\nvendor_id = 0x045e\nproduct_id = 0x028e\n");
        let input = FakeInput::new()
            .with_device(1, FakeDevice::new(TRIM_WHEEL, vec![0.8]))
            .with_device(2, FakeDevice::new(crate::input::DeviceIdentity::new(0x045e, 0x028e), vec![0.0]));

        let (status, pauses) = execute_with(&options(&config, Some("2")), input);

        assert_eq!(status, ExitStatus::WheelUntouched);
        assert_eq!(pauses.len(), 2);
    }

    #[test]
    fn broken_config_file_is_an_option_error() {
        let config = write_config("[polling\n");
        let (status, pauses) = execute_with(&options(&config, None), FakeInput::new());
        assert_eq!(status, ExitStatus::OptionError);
        assert!(pauses.is_empty());
    }

    #[test]
    fn unavailable_input_exits_twelve() {
        let config = write_config("");
        let status = execute(
            &options(&config, None),
            || Err(InputError::InitializationError("no backend".to_string())),
            Box::new(ScriptedKeys::none()),
            Box::new(RecordingPacer::default()),
        );
        assert_eq!(status, ExitStatus::InputUnavailable);
        assert_eq!(status.code(), 12);
    }

    #[test]
    fn oversized_cycle_count_keeps_the_configured_cap() {
        let config = write_config("[polling]\ninterval_ms = 5\nmax_cycles = 3\n");
        let input = FakeInput::new().with_device(1, FakeDevice::new(TRIM_WHEEL, vec![0.0]));

        let (status, pauses) = execute_with(&options(&config, Some("99999999999999999999")), input);

        assert_eq!(status, ExitStatus::WheelUntouched);
        assert_eq!(pauses, vec![Duration::from_millis(5); 3]);
    }
}
