//! Trim wheel monitor
//!
//! Polls every registered controller once per cycle and decides whether the
//! target wheel's primary axis has left its power-on zero:
//!
//! ```text
//! dispatch ──► registry ──► interpreter (per device) ──► progress ──► exit key / pause / cap
//! ```
//!
//! The monitor moves through `Initializing` (callback registration) and
//! `Polling` (the loop itself), see [`poll_loop::TrimwheelMonitor`].

pub mod interpreter;
pub mod keys;
pub mod pacing;
pub mod poll_loop;

use std::time::Duration;

use crate::input::{DeviceIdentity, InputError};

pub use interpreter::{DeviceReport, ReadingInterpreter, SkipReason, Verdict};
pub use keys::{ConsoleKeys, KeySource};
pub use pacing::{Pacer, ThreadPacer};
pub use poll_loop::{Outcome, PollState, TrimwheelMonitor};

/// Saitek Pro Flight Cessna Trim Wheel.
pub const TRIM_WHEEL: DeviceIdentity = DeviceIdentity::new(0x06A3, 0x0BD4);

/// One day of cycles at the normal one-second interval.
pub const ONE_DAY_CYCLES: u32 = 86_400;

/// What the last evaluation of the target wheel concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDecision {
    /// Axis 0 was nonzero: the wheel has been turned since power-on.
    Turned,
    /// Axis 0 read zero, the wheel may still be uninitialized.
    Untouched,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonitorSettings {
    pub target: DeviceIdentity,
    pub report_all: bool,
    pub silent: bool,
    pub loop_cap: u32,
    pub poll_interval: Duration,
    pub exit_key: char,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            target: TRIM_WHEEL,
            report_all: false,
            silent: false,
            loop_cap: ONE_DAY_CYCLES,
            poll_interval: Duration::from_millis(1000),
            exit_key: 'Q',
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Device callback registration failed: {0}")]
    RegistrationError(#[from] InputError),
}
