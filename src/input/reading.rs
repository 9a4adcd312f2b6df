//! Per-cycle controller readings and device identity.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{DeviceInfoBlock, DEVICE_INFO_HEADER_LEN};

/// Upper bound on captured axes, switches and buttons per controller.
pub const MAX_CONTROLS: usize = 64;

/// Current input state of one controller, valid for a single poll cycle.
///
/// The `*_state` methods fill `out` from the front and return how many
/// entries were written.
pub trait ControllerReading {
    fn timestamp(&self) -> DateTime<Local>;

    fn axis_count(&self) -> usize;
    fn switch_count(&self) -> usize;
    fn button_count(&self) -> usize;

    fn axis_state(&self, out: &mut [f32]) -> usize;
    fn switch_state(&self, out: &mut [SwitchPosition]) -> usize;
    fn button_state(&self, out: &mut [bool]) -> usize;
}

/// Vendor/product pair used to recognise the target controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("device info block too short ({size} bytes, need at least {min})")]
pub struct TruncatedInfo {
    pub size: u32,
    pub min: u32,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Extracts the identity from an info block whose size covers the header.
    pub fn from_info(info: &DeviceInfoBlock) -> Result<Self, TruncatedInfo> {
        if info.info_size < DEVICE_INFO_HEADER_LEN {
            return Err(TruncatedInfo {
                size: info.info_size,
                min: DEVICE_INFO_HEADER_LEN,
            });
        }
        Ok(Self::new(info.vendor_id, info.product_id))
    }

    /// Both ids must be equal.
    pub fn matches(&self, other: &DeviceIdentity) -> bool {
        self.vendor_id == other.vendor_id && self.product_id == other.product_id
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VID: {:#06x}, PID: {:#06x}", self.vendor_id, self.product_id)
    }
}

/// Hat switch position, numbered clockwise from up with 0 as center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SwitchPosition {
    #[default]
    Center,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl SwitchPosition {
    /// Folds four direction buttons into a position; opposite directions cancel.
    pub fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        let vertical = i8::from(up) - i8::from(down);
        let horizontal = i8::from(right) - i8::from(left);
        match (vertical, horizontal) {
            (1, 0) => Self::Up,
            (1, 1) => Self::UpRight,
            (0, 1) => Self::Right,
            (-1, 1) => Self::DownRight,
            (-1, 0) => Self::Down,
            (-1, -1) => Self::DownLeft,
            (0, -1) => Self::Left,
            (1, -1) => Self::UpLeft,
            _ => Self::Center,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Owned copy of one controller's reading, bounded to [`MAX_CONTROLS`] entries
/// per control kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSnapshot {
    pub captured_at: DateTime<Local>,
    pub axes: Vec<f32>,
    pub switches: Vec<SwitchPosition>,
    pub buttons: Vec<bool>,
}

impl ReadingSnapshot {
    pub fn capture(reading: &dyn ControllerReading) -> Self {
        let mut axes = [0.0_f32; MAX_CONTROLS];
        let mut switches = [SwitchPosition::Center; MAX_CONTROLS];
        let mut buttons = [false; MAX_CONTROLS];

        let axis_written = reading.axis_state(&mut axes);
        let switch_written = reading.switch_state(&mut switches);
        let button_written = reading.button_state(&mut buttons);

        let axis_count = reading.axis_count().min(axis_written).min(MAX_CONTROLS);
        let switch_count = reading.switch_count().min(switch_written).min(MAX_CONTROLS);
        let button_count = reading.button_count().min(button_written).min(MAX_CONTROLS);

        Self {
            captured_at: reading.timestamp(),
            axes: axes.iter().take(axis_count).copied().collect(),
            switches: switches.iter().take(switch_count).copied().collect(),
            buttons: buttons.iter().take(button_count).copied().collect(),
        }
    }

    /// Axis index 0, the wheel rotation on the trim wheel.
    pub fn primary_axis(&self) -> Option<f32> {
        self.axes.first().copied()
    }

    pub fn pressed_buttons(&self) -> impl Iterator<Item = usize> + '_ {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(index, _)| index)
    }
}

impl fmt::Display for ReadingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.axes.is_empty() {
            write!(f, "No Axes")?;
        } else {
            write!(f, "Axes -")?;
            for (index, value) in self.axes.iter().enumerate() {
                write!(f, " {index}:{value:.6}")?;
            }
        }

        if self.switches.is_empty() {
            write!(f, " | No Switches")?;
        } else {
            write!(f, " | Switches -")?;
            for (index, position) in self.switches.iter().enumerate() {
                write!(f, " {}:{}", index, position.index())?;
            }
        }

        if self.buttons.is_empty() {
            write!(f, " | No Buttons")
        } else {
            write!(f, " | Buttons -")?;
            for index in self.pressed_buttons() {
                write!(f, " {index}")?;
            }
            Ok(())
        }
    }
}
