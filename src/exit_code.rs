use std::process::ExitCode;

use crate::monitor::WheelDecision;

/// Process exit codes reported to the calling script.
///
/// When several apply, the earlier variant in this precedence wins:
/// help, option error, input unavailable, then the wheel decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// `-h` printed the usage text.
    HelpShown,
    /// Invalid command line or configuration file.
    OptionError,
    /// The input subsystem could not be initialized.
    InputUnavailable,
    /// Axis 0 of the trim wheel is nonzero.
    WheelTurned,
    /// Axis 0 of the trim wheel was zero at the last evaluation.
    WheelUntouched,
    /// The trim wheel was never evaluated.
    WheelNotEvaluated,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::WheelTurned => 0,
            Self::WheelUntouched => 1,
            Self::HelpShown => 4,
            Self::OptionError => 8,
            Self::InputUnavailable => 12,
            Self::WheelNotEvaluated => 16,
        }
    }

    pub fn from_decision(decision: Option<WheelDecision>) -> Self {
        match decision {
            Some(WheelDecision::Turned) => Self::WheelTurned,
            Some(WheelDecision::Untouched) => Self::WheelUntouched,
            None => Self::WheelNotEvaluated,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}
