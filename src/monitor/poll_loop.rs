use statum::{machine, state};
use tracing::{debug, info, trace, warn};

use super::interpreter::{DeviceReport, ReadingInterpreter, Verdict};
use super::keys::KeySource;
use super::pacing::Pacer;
use super::{MonitorError, MonitorSettings, WheelDecision};
use crate::exit_code::ExitStatus;
use crate::input::{DeviceRegistry, InputSubsystem};

/// Where the poll loop stands after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Target not evaluated yet.
    Running,
    /// Target seen with axis 0 at zero; polling continues.
    FoundZero,
    /// Target seen with axis 0 away from zero.
    FoundNonzero,
    /// User pressed the exit key.
    ExitKey,
    /// Cycle cap reached.
    LoopExhausted,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FoundNonzero | Self::ExitKey | Self::LoopExhausted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Always a terminal state.
    pub state: PollState,
    pub cycles: u32,
    pub decision: Option<WheelDecision>,
    /// Cycles in which the target wheel was not found.
    pub not_found_cycles: u32,
}

impl Outcome {
    pub fn exit_status(&self) -> ExitStatus {
        match self.state {
            PollState::FoundNonzero => ExitStatus::WheelTurned,
            _ => ExitStatus::from_decision(self.decision),
        }
    }
}

// found is per cycle, turned is sticky, decision is last-wins
#[derive(Debug, Default, Clone)]
pub struct PollProgress {
    found: bool,
    turned: bool,
    decision: Option<WheelDecision>,
}

impl PollProgress {
    fn record(&mut self, decision: WheelDecision) {
        self.found = true;
        match decision {
            WheelDecision::Turned => {
                self.turned = true;
                self.decision = Some(WheelDecision::Turned);
            }
            WheelDecision::Untouched if !self.turned => {
                self.decision = Some(WheelDecision::Untouched);
            }
            WheelDecision::Untouched => {}
        }
    }

    fn state(&self) -> PollState {
        match self.decision {
            Some(WheelDecision::Turned) => PollState::FoundNonzero,
            Some(WheelDecision::Untouched) => PollState::FoundZero,
            None => PollState::Running,
        }
    }
}

// Monitor lifecycle states
#[state]
#[derive(Debug, Clone)]
pub enum MonitorState {
    Initializing,
    Polling,
}

#[machine]
pub struct TrimwheelMonitor<S: MonitorState> {
    // Platform input API
    input: Box<dyn InputSubsystem>,

    // Exit key presses
    keys: Box<dyn KeySource>,

    // Sleep between cycles
    pacer: Box<dyn Pacer>,

    // Every controller seen connected this run
    registry: DeviceRegistry,

    interpreter: ReadingInterpreter,

    settings: MonitorSettings,

    progress: PollProgress,
}

#[cfg(test)]
impl<S: MonitorState> TrimwheelMonitor<S> {
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}

impl TrimwheelMonitor<Initializing> {
    pub fn create(
        input: Box<dyn InputSubsystem>,
        keys: Box<dyn KeySource>,
        pacer: Box<dyn Pacer>,
        settings: MonitorSettings,
    ) -> Self {
        debug!("Creating trim wheel monitor with settings: {:?}", settings);
        let interpreter = ReadingInterpreter::new(settings.target, settings.report_all);
        Self::new(
            input,
            keys,
            pacer,
            DeviceRegistry::new(),
            interpreter,
            settings,
            PollProgress::default(),
        )
    }

    // Enumerate connected controllers and transition to Polling state
    pub fn initialize(mut self) -> Result<TrimwheelMonitor<Polling>, MonitorError> {
        info!(
            "Registering device callback with {} input backend",
            self.input.backend_name()
        );
        self.input.register_device_callback(&mut self.registry)?;
        if self.registry.is_empty() {
            info!(
                "No controller registered yet, looking for {}",
                self.interpreter.target()
            );
        } else {
            info!(
                "{} controller(s) registered, looking for {}",
                self.registry.len(),
                self.interpreter.target()
            );
        }
        Ok(self.transition())
    }
}

impl TrimwheelMonitor<Polling> {
    pub fn run(mut self) -> Outcome {
        let cap = self.settings.loop_cap;
        info!(
            "Starting poll loop for up to {} cycles with sleep {} ms",
            cap,
            self.settings.poll_interval.as_millis()
        );
        info!(
            "Press exit-key '{}' (then Enter) to interrupt",
            self.settings.exit_key
        );

        let mut state = PollState::Running;
        let mut not_found_cycles = 0;
        let mut cycle = 0;

        loop {
            cycle += 1;
            self.poll_cycle(cycle);

            if !self.progress.found {
                not_found_cycles += 1;
                warn!(
                    "Target wheel ({}) not found in cycle {}",
                    self.settings.target, cycle
                );
            }

            let observed = self.progress.state();
            if observed != state {
                debug!("Poll state {:?} -> {:?}", state, observed);
                state = observed;
            }

            if self.progress.turned {
                info!("Trim wheel axis is nonzero, stopping loop");
                return self.finish(PollState::FoundNonzero, cycle, not_found_cycles);
            }

            if self.exit_key_pressed() {
                return self.finish(PollState::ExitKey, cycle, not_found_cycles);
            }

            self.pacer.pause(self.settings.poll_interval);

            if cycle >= cap {
                info!("Cycle limit {} reached, stopping loop", cap);
                return self.finish(PollState::LoopExhausted, cycle, not_found_cycles);
            }
        }
    }

    fn poll_cycle(&mut self, cycle: u32) {
        if !self.settings.silent {
            info!("*** Cycle {}, exit='{}' ***", cycle, self.settings.exit_key);
        }

        let pending = self.input.dispatch(&mut self.registry);
        debug!(
            "Input dispatcher work pending: {}",
            if pending { "yes" } else { "no" }
        );

        self.progress.found = false;

        let handles = self.registry.handles().to_vec();
        debug!("Checking {} controller(s)", handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match self.interpreter.evaluate(self.input.as_ref(), index, handle) {
                Ok(report) => self.record(report),
                Err(reason) => warn!("{}", reason),
            }
        }
    }

    fn record(&mut self, report: DeviceReport) {
        if let Some(snapshot) = &report.snapshot {
            debug!(
                "Controller {} ({}, {}) captured at {}",
                report.index,
                report.name.as_deref().unwrap_or("unnamed"),
                report.identity,
                snapshot.captured_at.format("%H:%M:%S%.3f")
            );
            if !self.settings.silent {
                info!("Controller {}: {}", report.index, snapshot);
            }
        }

        match report.verdict {
            Verdict::Other => trace!("Controller {} is not the target wheel", report.index),
            Verdict::Wheel(decision) => {
                debug!(
                    "Trim wheel is controller {} ({}), decision {:?}",
                    report.index, report.handle, decision
                );
                self.progress.record(decision);
            }
        }
    }

    fn exit_key_pressed(&mut self) -> bool {
        let mut pressed = false;
        for key in self.keys.drain_keys() {
            debug!("Key pressed: {:?}", key);
            if key.to_ascii_uppercase() == self.settings.exit_key {
                info!("Exit-key '{}' detected, stopping loop", self.settings.exit_key);
                pressed = true;
            }
        }
        pressed
    }

    fn finish(&self, state: PollState, cycles: u32, not_found_cycles: u32) -> Outcome {
        debug_assert!(state.is_terminal());
        let outcome = Outcome {
            state,
            cycles,
            decision: self.progress.decision,
            not_found_cycles,
        };
        info!(
            "Poll loop ended in state {:?} after {} cycle(s), exit code {}",
            outcome.state,
            outcome.cycles,
            outcome.exit_status().code()
        );
        outcome
    }
}
