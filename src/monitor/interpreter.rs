use tracing::trace;

use super::WheelDecision;
use crate::input::reading::TruncatedInfo;
use crate::input::{DeviceHandle, DeviceIdentity, InputError, InputSubsystem, ReadingSnapshot};

/// How a successfully evaluated controller relates to the target wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Other,
    Wheel(WheelDecision),
}

/// Result of evaluating one registered controller in one cycle.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    /// Position in the registry.
    pub index: usize,
    pub handle: DeviceHandle,
    pub identity: DeviceIdentity,
    pub name: Option<String>,
    pub verdict: Verdict,
    /// Present for the target wheel, and for every controller in report-all mode.
    pub snapshot: Option<ReadingSnapshot>,
}

/// Why a controller could not be evaluated this cycle.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("No reading for controller {index}: {source}")]
    NoReading { index: usize, source: InputError },

    #[error("Cannot get information for controller {index}: {source}")]
    NoInfo { index: usize, source: InputError },

    #[error("Cannot get information for controller {index}: {source}")]
    Truncated { index: usize, source: TruncatedInfo },
}

#[derive(Debug, Clone)]
pub struct ReadingInterpreter {
    target: DeviceIdentity,
    report_all: bool,
}

impl ReadingInterpreter {
    pub fn new(target: DeviceIdentity, report_all: bool) -> Self {
        Self { target, report_all }
    }

    pub fn target(&self) -> DeviceIdentity {
        self.target
    }

    pub fn evaluate(
        &self,
        input: &dyn InputSubsystem,
        index: usize,
        handle: DeviceHandle,
    ) -> Result<DeviceReport, SkipReason> {
        let reading = input
            .current_reading(handle)
            .map_err(|source| SkipReason::NoReading { index, source })?;

        let info = input
            .device_info(handle)
            .map_err(|source| SkipReason::NoInfo { index, source })?;
        let identity = DeviceIdentity::from_info(&info)
            .map_err(|source| SkipReason::Truncated { index, source })?;
        trace!(
            "Controller {} info: size {}, {}, REV: {:#06x}, IFC: {:#04x}, COL: {:#04x}",
            index,
            info.info_size,
            identity,
            info.revision_number,
            info.interface_number,
            info.collection_number
        );

        let is_target = identity.matches(&self.target);
        let snapshot =
            (self.report_all || is_target).then(|| ReadingSnapshot::capture(reading.as_ref()));

        let verdict = if is_target {
            Verdict::Wheel(decide(snapshot.as_ref()))
        } else {
            Verdict::Other
        };

        Ok(DeviceReport {
            index,
            handle,
            identity,
            name: info.display_name,
            verdict,
            snapshot,
        })
    }
}

/// A wheel reporting no axes at all is treated like one reading zero.
fn decide(snapshot: Option<&ReadingSnapshot>) -> WheelDecision {
    match snapshot.and_then(ReadingSnapshot::primary_axis) {
        Some(value) if value != 0.0 => WheelDecision::Turned,
        _ => WheelDecision::Untouched,
    }
}
