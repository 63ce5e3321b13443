// DPMS power sequencing.
//
// CRT1 goes dark through the sequencer sync-disable bits and the screen-off
// bit, CRT2 through its panel backlight or TV encoder power. A reset pulse
// makes the new state take effect.

use std::fmt;
use std::rc::Rc;

use crate::chip::{BridgeFamily, ChipFamily};
use crate::context::{DeviceContext, HeadRole};
use crate::hw::regs::{SR01_SCREEN_OFF, SR1F_HSYNC_OFF, SR1F_SYNC_MASK, SR1F_VSYNC_OFF, SR_CLOCKING, SR_POWER};
use crate::hw::{Bank, RegisterLock, Regs};
use crate::output::Crt2Device;
use crate::switch::{reset_pulse, SwitchError};
use crate::tv;

#[cfg(test)]
#[path = "./power_test.rs"]
mod power_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Standby,
    Suspend,
    Off,
}

impl PowerState {
    /// SR1F sync-disable bits
    pub fn sync_bits(self) -> u8 {
        match self {
            PowerState::On => 0,
            PowerState::Standby => SR1F_HSYNC_OFF,
            PowerState::Suspend => SR1F_VSYNC_OFF,
            PowerState::Off => SR1F_HSYNC_OFF | SR1F_VSYNC_OFF,
        }
    }

    pub fn is_on(self) -> bool {
        self == PowerState::On
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            PowerState::On => "on",
            PowerState::Standby => "standby",
            PowerState::Suspend => "suspend",
            PowerState::Off => "off",
        };
        write!(f, "{}", s)
    }
}

/// Outputs a power transition acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerTargets {
    pub crt1: bool,
    pub crt2: Crt2Device,
}

impl PowerTargets {
    /// Dual head roles are fixed: the slave is CRT1, the master is CRT2.
    pub fn for_head(role: HeadRole, crt2: Crt2Device) -> Self {
        match role {
            HeadRole::Slave => PowerTargets { crt1: true, crt2: Crt2Device::None },
            HeadRole::Master => PowerTargets { crt1: false, crt2 },
            HeadRole::Sole => PowerTargets { crt1: true, crt2 },
        }
    }
}

/// Runs one power transition. `sr01` is the blank register as read before
/// the sequence started. The lock must be held.
pub fn power_sequence(
    regs: &mut Regs,
    family: ChipFamily,
    bridge: BridgeFamily,
    sr01: u8,
    targets: PowerTargets,
    state: PowerState,
) {
    if targets.crt1 {
        regs.set(Bank::Sr, SR_POWER, !SR1F_SYNC_MASK, state.sync_bits());
        let sr01 = if state.is_on() { sr01 & !SR01_SCREEN_OFF } else { sr01 | SR01_SCREEN_OFF };
        regs.write(Bank::Sr, SR_CLOCKING, sr01);
    }
    tv::crt2_power(regs, family, bridge, targets.crt2, state.is_on());
    reset_pulse(regs);
}

impl DeviceContext {
    /// Moves the outputs of this head to a DPMS state.
    pub fn set_power(&mut self, state: PowerState) -> Result<(), SwitchError> {
        let _guard = self.begin()?;
        let targets = match self.role {
            HeadRole::Sole => PowerTargets {
                crt1: self.output.crt1(),
                crt2: self.output.crt2(),
            },
            role => PowerTargets::for_head(role, self.output.crt2()),
        };
        let io = Rc::clone(&self.io);
        let mut hw = io.borrow_mut();
        let mut lock = RegisterLock::acquire(Regs::new(&mut *hw, self.ports), self.caps.legacy_lock);
        let sr01 = lock.read(Bank::Sr, SR_CLOCKING);
        log::debug!("{:?} head: power {} -> {}", self.role, self.power, state);
        power_sequence(&mut lock, self.chip.family(), self.detected.bridge, sr01, targets, state);
        self.power = state;
        Ok(())
    }
}
