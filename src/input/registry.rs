use tracing::debug;

use super::{DeviceEventSink, DeviceHandle, DeviceStatus};

/// Insertion-ordered list of every controller seen connected during this run.
///
/// Entries are never removed; a controller that disconnects simply fails to
/// produce readings until it comes back under the same handle.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    devices: Vec<DeviceHandle>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn handles(&self) -> &[DeviceHandle] {
        &self.devices
    }
}

impl DeviceEventSink for DeviceRegistry {
    fn on_device_event(&mut self, handle: DeviceHandle, current: DeviceStatus, previous: DeviceStatus) {
        debug!(
            "Device event for {}: status {} (was {})",
            handle, current, previous
        );

        if !current.is_connected() {
            return;
        }

        if let Some(position) = self.devices.iter().position(|known| *known == handle) {
            debug!("Controller {} unchanged (slot {})", handle, position);
            return;
        }

        self.devices.push(handle);
        debug!(
            "Controller {} added, {} controller(s) registered",
            handle,
            self.devices.len()
        );
    }
}
