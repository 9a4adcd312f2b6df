//! Input subsystem boundary
//!
//! Everything the monitor needs from the platform input API goes through
//! [`InputSubsystem`]:
//!
//! ```text
//! register_device_callback ──► DeviceEventSink (enumeration, once)
//! dispatch                 ──► DeviceEventSink (live status changes, every cycle)
//! current_reading          ──► ControllerReading (axes, switches, buttons)
//! device_info              ──► DeviceInfoBlock (vendor/product identity)
//! ```
//!
//! The production backend is [`gilrs_backend::GilrsInput`]; tests drive the
//! monitor through the scripted backend in `fake`.

pub mod gilrs_backend;
pub mod reading;
pub mod registry;

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::ops::BitOr;

pub use reading::{ControllerReading, DeviceIdentity, ReadingSnapshot, SwitchPosition};
pub use registry::DeviceRegistry;

/// Opaque reference to one attached controller.
///
/// Handles are handed out by the input subsystem and only compared for
/// identity; the subsystem keeps ownership of whatever they point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(usize);

impl DeviceHandle {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connection and input status flags reported with a device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStatus(u32);

impl DeviceStatus {
    pub const NONE: Self = Self(0x0000_0000);
    pub const CONNECTED: Self = Self(0x0000_0001);
    pub const INPUT_ENABLED: Self = Self(0x0000_0002);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_connected(self) -> bool {
        self.contains(Self::CONNECTED)
    }
}

impl BitOr for DeviceStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Receiver of device status notifications.
///
/// Called synchronously from inside [`InputSubsystem::register_device_callback`]
/// and [`InputSubsystem::dispatch`], never from another thread.
pub trait DeviceEventSink {
    fn on_device_event(&mut self, handle: DeviceHandle, current: DeviceStatus, previous: DeviceStatus);
}

/// Minimum `info_size` covering the identity header:
/// size (4) + vendor (2) + product (2) + revision (2) + interface (1) + collection (1).
pub const DEVICE_INFO_HEADER_LEN: u32 = 12;

/// Device attribute block as reported by the input subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfoBlock {
    /// Number of valid bytes in the block; fields beyond it are meaningless.
    pub info_size: u32,
    pub vendor_id: u16,
    pub product_id: u16,
    pub revision_number: u16,
    pub interface_number: u8,
    pub collection_number: u8,
    pub display_name: Option<String>,
}

// Input subsystem errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to initialize input subsystem: {0}")]
    InitializationError(String),

    #[error("Unknown device {0}")]
    UnknownDevice(DeviceHandle),

    #[error("No current reading for device {handle}: {reason}")]
    ReadingUnavailable { handle: DeviceHandle, reason: String },

    #[error("No device info for device {handle}: {reason}")]
    InfoUnavailable { handle: DeviceHandle, reason: String },
}

/// Platform input API as seen by the monitor.
pub trait InputSubsystem {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &str;

    /// Enumerates every connected controller into `sink` before returning and
    /// arms notifications for later status changes, which are delivered by
    /// [`dispatch`](Self::dispatch).
    fn register_device_callback(&mut self, sink: &mut dyn DeviceEventSink) -> Result<(), InputError>;

    /// Runs at least one unit of pending background work without blocking.
    ///
    /// Returns `true` when work items are still queued afterwards.
    fn dispatch(&mut self, sink: &mut dyn DeviceEventSink) -> bool;

    /// Captures the current input state of one controller.
    fn current_reading(&self, handle: DeviceHandle) -> Result<Box<dyn ControllerReading>, InputError>;

    fn device_info(&self, handle: DeviceHandle) -> Result<DeviceInfoBlock, InputError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_bit_is_detected_among_other_flags() {
        let wireless = DeviceStatus(0x0000_0080);
        let status = DeviceStatus::INPUT_ENABLED | DeviceStatus::CONNECTED | wireless;
        assert!(status.is_connected());
        assert!(!(DeviceStatus::INPUT_ENABLED | wireless).is_connected());
        assert!(!DeviceStatus::NONE.is_connected());
        assert!(DeviceStatus(0x00FF_FFFF).is_connected());
    }

    #[test]
    fn handle_display_shows_raw_value() {
        assert_eq!(DeviceHandle::new(3).to_string(), "#3");
        assert_eq!(DeviceStatus::CONNECTED.to_string(), "0x00000001");
    }
}
