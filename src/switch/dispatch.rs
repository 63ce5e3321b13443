// The mode switch sequence of one head:
// Idle -> BridgePreConfigured -> Switched -> BridgePostConfigured -> Idle.
//
// The whole sequence runs under one register lock and one busy guard, so
// neither the sibling head nor a power or restore call can observe it half
// way.

use std::rc::Rc;

use crate::context::{DeviceContext, HeadRole};
use crate::hw::{RegisterLock, Regs};
use crate::modes::{rate_refresh, validate_mode, ModeDescriptor};
use crate::switch::bridge::{post_configure, pre_configure, BridgeSetup};
use crate::switch::strategy::{select_strategy, SwitchError, SwitchJob, SwitchReport, SwitchState};

const DEBUG_SET_MODE: bool = false;

impl DeviceContext {
    fn enter_state(&mut self, trace: &mut Vec<SwitchState>, state: SwitchState) {
        if DEBUG_SET_MODE {
            log::trace!("{:?} head: {:?} -> {:?}", self.role, self.state, state);
        }
        self.state = state;
        trace.push(state);
    }

    /// Switches this head to `mode`. On failure the previous mode stays the
    /// current one and the dispatcher is back in `Idle`.
    pub fn set_mode(&mut self, mode: &ModeDescriptor) -> Result<SwitchReport, SwitchError> {
        let _guard = self.begin()?;
        if self.role != HeadRole::Sole && !self.heads_complete() {
            return Err(SwitchError::LoneHead);
        }
        // a narrowing seen by the last switch does not carry over
        if self.output != self.intended {
            self.output = self.intended.clone();
            self.revalidate();
        }

        let strategy = select_strategy(self.vesa, self.caps, self.role);
        let mode = validate_mode(&self.validation_env(), mode)?;
        let rate_index = mode.rate_index.unwrap_or(1);
        let pitch = self.pitch_for(&mode);
        log::info!(
            "{:?} head: {} via {} (rate index {}, {:?} Hz)",
            self.role,
            mode,
            strategy.name(),
            rate_index,
            rate_refresh(mode.hdisplay, mode.vdisplay, rate_index)
        );

        let io = Rc::clone(&self.io);
        let mut hw = io.borrow_mut();
        let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
        let mut trace = vec![SwitchState::Idle];

        let setup = BridgeSetup {
            caps: self.caps,
            bridge: self.detected.bridge,
            role: self.role,
            output: &self.output,
            vesa: self.vesa,
            rate_index,
            panel_delay: self.options.panel_delay_compensation,
            queue_mode: self.options.queue_mode,
            video_memory_kb: self.probe.video_memory_kb,
        };
        pre_configure(&mut lock, &setup);
        self.enter_state(&mut trace, SwitchState::BridgePreConfigured);

        let depth = self.options.depth;
        let res = {
            let job = SwitchJob {
                caps: self.caps,
                bridge: self.detected.bridge,
                role: self.role,
                output: &self.output,
                mode: &mode,
                depth,
                pitch,
            };
            strategy.switch(&job, &mut lock)
        };
        if let Err(e) = res {
            log::warn!("{:?} head: {} switch to {} failed: {}", self.role, strategy.name(), mode, e);
            self.state = SwitchState::Idle;
            return Err(e);
        }
        self.enter_state(&mut trace, SwitchState::Switched);

        let before = self.output.clone();
        let outcome = post_configure(
            &mut lock,
            self.caps,
            self.detected.bridge,
            self.role,
            &self.intended,
            &mut self.output,
        );
        self.enter_state(&mut trace, SwitchState::BridgePostConfigured);
        if outcome.crt1_toggled {
            log::debug!("CRT1 enable changed, reset pulsed");
        }
        if self.output != before {
            log::info!("{:?} head: output now {}", self.role, self.output);
            self.revalidate();
        }

        self.reapply_tv(&mut lock);

        let finished = {
            let job = SwitchJob {
                caps: self.caps,
                bridge: self.detected.bridge,
                role: self.role,
                output: &self.output,
                mode: &mode,
                depth,
                pitch,
            };
            strategy.finish(&job, &mut lock)
        };

        let report = SwitchReport {
            strategy: strategy.kind(),
            path: strategy.name(),
            relation: self.output.relation(),
            rate_index,
            bios_mode: mode.bios_mode,
            downgraded: outcome.downgraded,
            trace,
        };
        self.current = Some(mode);
        self.state = SwitchState::Idle;
        finished?;
        Ok(report)
    }
}
