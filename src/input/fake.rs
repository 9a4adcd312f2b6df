//! Scripted input subsystem for exercising the monitor without hardware.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Local};

use super::reading::{ControllerReading, DeviceIdentity, SwitchPosition};
use super::{
    DeviceEventSink, DeviceHandle, DeviceInfoBlock, DeviceStatus, InputError, InputSubsystem,
    DEVICE_INFO_HEADER_LEN,
};

#[derive(Debug, Clone)]
pub struct FakeDevice {
    info: Option<DeviceInfoBlock>,
    /// Primary axis value per cycle; the last value repeats. Empty means no axes.
    axis_script: Vec<f32>,
    failing_cycles: Vec<usize>,
}

impl FakeDevice {
    pub fn new(identity: DeviceIdentity, axis_script: Vec<f32>) -> Self {
        Self {
            info: Some(DeviceInfoBlock {
                info_size: DEVICE_INFO_HEADER_LEN,
                vendor_id: identity.vendor_id,
                product_id: identity.product_id,
                display_name: Some("Fake Controller".to_string()),
                ..Default::default()
            }),
            axis_script,
            failing_cycles: Vec::new(),
        }
    }

    pub fn with_info_size(mut self, info_size: u32) -> Self {
        if let Some(info) = self.info.as_mut() {
            info.info_size = info_size;
        }
        self
    }

    pub fn without_info(mut self) -> Self {
        self.info = None;
        self
    }

    /// Readings fail on these (1-based) cycles.
    pub fn failing_on(mut self, cycles: &[usize]) -> Self {
        self.failing_cycles = cycles.to_vec();
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeInput {
    devices: BTreeMap<DeviceHandle, FakeDevice>,
    initial: Vec<DeviceHandle>,
    /// Status events delivered by successive dispatch calls.
    scheduled: VecDeque<Vec<(DeviceHandle, DeviceStatus)>>,
    cycle: usize,
}

impl FakeInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device connected before registration.
    pub fn with_device(mut self, raw: usize, device: FakeDevice) -> Self {
        let handle = DeviceHandle::new(raw);
        self.devices.insert(handle, device);
        self.initial.push(handle);
        self
    }

    /// Device that shows up through the dispatch call of the given (1-based) cycle.
    pub fn connecting_on(mut self, cycle: usize, raw: usize, device: FakeDevice) -> Self {
        let handle = DeviceHandle::new(raw);
        self.devices.insert(handle, device);
        self.schedule(cycle, handle, DeviceStatus::CONNECTED);
        self
    }

    /// Repeats a status notification for an already known device.
    pub fn notifying_on(mut self, cycle: usize, raw: usize, status: DeviceStatus) -> Self {
        self.schedule(cycle, DeviceHandle::new(raw), status);
        self
    }

    fn schedule(&mut self, cycle: usize, handle: DeviceHandle, status: DeviceStatus) {
        while self.scheduled.len() < cycle {
            self.scheduled.push_back(Vec::new());
        }
        if let Some(slot) = self.scheduled.get_mut(cycle - 1) {
            slot.push((handle, status));
        }
    }
}

impl InputSubsystem for FakeInput {
    fn backend_name(&self) -> &str {
        "fake"
    }

    fn register_device_callback(&mut self, sink: &mut dyn DeviceEventSink) -> Result<(), InputError> {
        for handle in &self.initial {
            sink.on_device_event(*handle, DeviceStatus::CONNECTED, DeviceStatus::NONE);
        }
        Ok(())
    }

    fn dispatch(&mut self, sink: &mut dyn DeviceEventSink) -> bool {
        self.cycle += 1;
        if let Some(events) = self.scheduled.pop_front() {
            for (handle, status) in events {
                sink.on_device_event(handle, status, DeviceStatus::NONE);
            }
        }
        !self.scheduled.is_empty()
    }

    fn current_reading(&self, handle: DeviceHandle) -> Result<Box<dyn ControllerReading>, InputError> {
        let device = self
            .devices
            .get(&handle)
            .ok_or(InputError::UnknownDevice(handle))?;
        if device.failing_cycles.contains(&self.cycle) {
            return Err(InputError::ReadingUnavailable {
                handle,
                reason: "scripted failure".to_string(),
            });
        }

        let axes = match device.axis_script.len() {
            0 => Vec::new(),
            len => {
                let index = self.cycle.saturating_sub(1).min(len - 1);
                device.axis_script.get(index).copied().into_iter().collect()
            }
        };
        Ok(Box::new(FakeReading {
            axes,
            buttons: vec![false, true],
        }))
    }

    fn device_info(&self, handle: DeviceHandle) -> Result<DeviceInfoBlock, InputError> {
        self.devices
            .get(&handle)
            .and_then(|device| device.info.clone())
            .ok_or_else(|| InputError::InfoUnavailable {
                handle,
                reason: "scripted failure".to_string(),
            })
    }
}

struct FakeReading {
    axes: Vec<f32>,
    buttons: Vec<bool>,
}

impl ControllerReading for FakeReading {
    fn timestamp(&self) -> DateTime<Local> {
        Local::now()
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn switch_count(&self) -> usize {
        1
    }

    fn button_count(&self) -> usize {
        self.buttons.len()
    }

    fn axis_state(&self, out: &mut [f32]) -> usize {
        fill(&self.axes, out)
    }

    fn switch_state(&self, out: &mut [SwitchPosition]) -> usize {
        fill(&[SwitchPosition::Center], out)
    }

    fn button_state(&self, out: &mut [bool]) -> usize {
        fill(&self.buttons, out)
    }
}

fn fill<T: Copy>(source: &[T], out: &mut [T]) -> usize {
    let mut written = 0;
    for (slot, value) in out.iter_mut().zip(source) {
        *slot = *value;
        written += 1;
    }
    written
}
