use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, trace, warn};

use super::reading::{ControllerReading, SwitchPosition};
use super::{
    DeviceEventSink, DeviceHandle, DeviceInfoBlock, DeviceStatus, InputError, InputSubsystem,
    DEVICE_INFO_HEADER_LEN,
};

/// Status notifications delivered per [`InputSubsystem::dispatch`] call.
const DISPATCH_QUOTA: usize = 64;

/// Deflection at which an analog D-pad axis counts as pressed.
const DPAD_AXIS_THRESHOLD: f32 = 0.5;

/// [`InputSubsystem`] backed by gilrs.
pub struct GilrsInput {
    gilrs: Gilrs,
    known: HashMap<DeviceHandle, GamepadId>,
    pending: StatusQueue,
}

/// Device status notifications waiting for the sink.
#[derive(Debug, Default)]
struct StatusQueue {
    queue: VecDeque<(DeviceHandle, DeviceStatus, DeviceStatus)>,
}

impl StatusQueue {
    fn push(&mut self, handle: DeviceHandle, current: DeviceStatus, previous: DeviceStatus) {
        self.queue.push_back((handle, current, previous));
    }

    /// Hands at most `quota` notifications to `sink`; `true` while some remain.
    fn deliver(&mut self, sink: &mut dyn DeviceEventSink, quota: usize) -> bool {
        for _ in 0..quota {
            let Some((handle, current, previous)) = self.queue.pop_front() else {
                break;
            };
            sink.on_device_event(handle, current, previous);
        }
        !self.queue.is_empty()
    }
}

impl GilrsInput {
    pub fn new() -> Result<Self, InputError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::InitializationError(e.to_string()));
            }
        };

        Ok(Self {
            gilrs,
            known: HashMap::new(),
            pending: StatusQueue::default(),
        })
    }

    fn gamepad(&self, handle: DeviceHandle) -> Option<Gamepad<'_>> {
        let id = self.known.get(&handle)?;
        self.gilrs.connected_gamepad(*id)
    }
}

fn handle_for(id: GamepadId) -> DeviceHandle {
    DeviceHandle::new(usize::from(id))
}

fn status_of(gamepad: &Gamepad<'_>) -> DeviceStatus {
    if gamepad.is_connected() {
        DeviceStatus::CONNECTED | DeviceStatus::INPUT_ENABLED
    } else {
        DeviceStatus::NONE
    }
}

impl InputSubsystem for GilrsInput {
    fn backend_name(&self) -> &str {
        "gilrs"
    }

    fn register_device_callback(&mut self, sink: &mut dyn DeviceEventSink) -> Result<(), InputError> {
        let mut count = 0;
        for (id, gamepad) in self.gilrs.gamepads() {
            let handle = handle_for(id);
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                count,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
            self.known.insert(handle, id);
            sink.on_device_event(handle, status_of(&gamepad), DeviceStatus::NONE);
            count += 1;
        }

        if count == 0 {
            warn!("No controller connected, waiting for connect events");
        } else {
            info!("Enumerated {} controller(s)", count);
        }
        Ok(())
    }

    fn dispatch(&mut self, sink: &mut dyn DeviceEventSink) -> bool {
        // Gilrs only updates gamepad state while events are pulled, so the
        // event queue is always emptied; only the notifications are bounded.
        let mut pulled = 0usize;
        while let Some(Event { id, event, time, .. }) = self.gilrs.next_event() {
            pulled += 1;
            let handle = handle_for(id);
            trace!("Processing gilrs event: {:?} at time: {:?}", event, time);

            match event {
                EventType::Connected => {
                    info!("Controller {} connected", handle);
                    self.known.insert(handle, id);
                    self.pending.push(
                        handle,
                        DeviceStatus::CONNECTED | DeviceStatus::INPUT_ENABLED,
                        DeviceStatus::NONE,
                    );
                }
                EventType::Disconnected => {
                    warn!("Controller {} disconnected", handle);
                    self.pending.push(
                        handle,
                        DeviceStatus::NONE,
                        DeviceStatus::CONNECTED | DeviceStatus::INPUT_ENABLED,
                    );
                }
                _ => {
                    if !self.known.contains_key(&handle) {
                        debug!("Input from unregistered controller {}, registering", handle);
                        self.known.insert(handle, id);
                        let status = status_of(&self.gilrs.gamepad(id));
                        self.pending.push(handle, status, DeviceStatus::NONE);
                    }
                }
            }
        }
        if pulled > 0 {
            trace!("Pulled {} gilrs event(s)", pulled);
        }
        self.pending.deliver(sink, DISPATCH_QUOTA)
    }

    fn current_reading(&self, handle: DeviceHandle) -> Result<Box<dyn ControllerReading>, InputError> {
        if !self.known.contains_key(&handle) {
            return Err(InputError::UnknownDevice(handle));
        }
        let gamepad = self
            .gamepad(handle)
            .ok_or_else(|| InputError::ReadingUnavailable {
                handle,
                reason: "controller is not connected".to_string(),
            })?;
        Ok(Box::new(GilrsReading::capture(&gamepad)))
    }

    fn device_info(&self, handle: DeviceHandle) -> Result<DeviceInfoBlock, InputError> {
        let gamepad = self
            .gamepad(handle)
            .ok_or_else(|| InputError::InfoUnavailable {
                handle,
                reason: "controller is not connected".to_string(),
            })?;

        let display_name = Some(gamepad.name().to_string());
        match (gamepad.vendor_id(), gamepad.product_id()) {
            (Some(vendor_id), Some(product_id)) => Ok(DeviceInfoBlock {
                info_size: DEVICE_INFO_HEADER_LEN,
                vendor_id,
                product_id,
                display_name,
                ..Default::default()
            }),
            // Only the size prefix is meaningful without USB ids.
            _ => Ok(DeviceInfoBlock {
                info_size: 4,
                display_name,
                ..Default::default()
            }),
        }
    }
}

/// Gamepad state copied out of gilrs at capture time.
///
/// Axes and buttons are ordered by native event code, so axis 0 is the
/// controller's lowest axis code (X on most HID joysticks).
struct GilrsReading {
    timestamp: DateTime<Local>,
    axes: Vec<f32>,
    switches: Vec<SwitchPosition>,
    buttons: Vec<bool>,
}

impl GilrsReading {
    fn capture(gamepad: &Gamepad<'_>) -> Self {
        let state = gamepad.state();

        let mut axes: Vec<(u32, f32)> = state
            .axes()
            .map(|(code, data)| (code.into_u32(), data.value()))
            .collect();
        axes.sort_by_key(|(code, _)| *code);

        let mut buttons: Vec<(u32, bool)> = state
            .buttons()
            .map(|(code, data)| (code.into_u32(), data.is_pressed()))
            .collect();
        buttons.sort_by_key(|(code, _)| *code);

        let has_dpad = gamepad.button_code(Button::DPadUp).is_some()
            || gamepad.axis_code(Axis::DPadY).is_some();
        let switches = if has_dpad {
            let vertical = gamepad.value(Axis::DPadY);
            let horizontal = gamepad.value(Axis::DPadX);
            vec![SwitchPosition::from_directions(
                gamepad.is_pressed(Button::DPadUp) || vertical > DPAD_AXIS_THRESHOLD,
                gamepad.is_pressed(Button::DPadDown) || vertical < -DPAD_AXIS_THRESHOLD,
                gamepad.is_pressed(Button::DPadLeft) || horizontal < -DPAD_AXIS_THRESHOLD,
                gamepad.is_pressed(Button::DPadRight) || horizontal > DPAD_AXIS_THRESHOLD,
            )]
        } else {
            Vec::new()
        };

        Self {
            timestamp: Local::now(),
            axes: axes.into_iter().map(|(_, value)| value).collect(),
            switches,
            buttons: buttons.into_iter().map(|(_, pressed)| pressed).collect(),
        }
    }
}

fn copy_into<T: Copy>(source: &[T], out: &mut [T]) -> usize {
    let written = source.len().min(out.len());
    for (slot, value) in out.iter_mut().zip(source.iter()) {
        *slot = *value;
    }
    written
}

impl ControllerReading for GilrsReading {
    fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn switch_count(&self) -> usize {
        self.switches.len()
    }

    fn button_count(&self) -> usize {
        self.buttons.len()
    }

    fn axis_state(&self, out: &mut [f32]) -> usize {
        copy_into(&self.axes, out)
    }

    fn switch_state(&self, out: &mut [SwitchPosition]) -> usize {
        copy_into(&self.switches, out)
    }

    fn button_state(&self, out: &mut [bool]) -> usize {
        copy_into(&self.buttons, out)
    }
}
