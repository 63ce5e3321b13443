// Mode switch strategies and the dispatcher's vocabulary.

use quick_error::quick_error;

use crate::bios::BiosError;
use crate::chip::{BridgeFamily, FamilyCaps};
use crate::context::HeadRole;
use crate::hw::Regs;
use crate::modes::{ModeDescriptor, RejectReason};
use crate::output::{OutputConfig, Relation};
use crate::switch::legacy::LEGACY;
use crate::switch::native::{NATIVE_COMBINED, NATIVE_CRT1, NATIVE_CRT2};
use crate::switch::vesa::VESA;

/// StrategyKind names the three ways of switching a mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// real-mode VBE BIOS call
    Vesa,
    /// BIOS-emulation register programming (300/315 families)
    Native,
    /// direct VGA table replay
    Legacy,
}

/// Dispatcher progress. Anything but `Idle` is only seen from inside a
/// `set_mode` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchState {
    Idle,
    BridgePreConfigured,
    Switched,
    BridgePostConfigured,
}

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SwitchError {
        Busy {
            display("another register sequence is running on this device")
        }
        Rejected(reason: RejectReason) {
            from()
            display("mode rejected: {}", reason)
        }
        Bios(err: BiosError) {
            from()
            display("BIOS mode switch failed: {}", err)
        }
        NoModeNumber {
            display("mode has no BIOS mode number")
        }
        Replay(what: &'static str) {
            display("register table replay failed: {}", what)
        }
        LoneHead {
            display("dual head needs both heads bound before switching")
        }
    }
}

/// Outcome of a successful mode switch.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchReport {
    pub strategy: StrategyKind,
    pub path: &'static str,
    /// the relation in effect, after any slave mode narrowing
    pub relation: Relation,
    pub rate_index: u8,
    pub bios_mode: Option<u16>,
    pub downgraded: bool,
    pub trace: Vec<SwitchState>,
}

/// Read-only inputs of one strategy run.
pub struct SwitchJob<'a> {
    pub caps: &'static FamilyCaps,
    pub bridge: BridgeFamily,
    pub role: HeadRole,
    pub output: &'a OutputConfig,
    pub mode: &'a ModeDescriptor,
    pub depth: u8,
    /// virtual width in pixels
    pub pitch: u16,
}

pub trait SwitchStrategy {
    fn kind(&self) -> StrategyKind;

    /// sub-path name, for logs and reports
    fn name(&self) -> &'static str;

    /// Programs the mode. Runs between bridge pre- and post-configuration
    /// with the extended registers unlocked.
    fn switch(&self, job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError>;

    /// Runs after post-configuration and TV parameter reapplication.
    fn finish(&self, _job: &SwitchJob, _regs: &mut Regs) -> Result<(), SwitchError> {
        Ok(())
    }
}

/// Picks the strategy once per mode switch.
pub fn select_strategy(vesa: bool, caps: &FamilyCaps, role: HeadRole) -> &'static dyn SwitchStrategy {
    if vesa {
        return &VESA;
    }
    if caps.native_switch {
        return match role {
            HeadRole::Sole => &NATIVE_COMBINED,
            HeadRole::Master => &NATIVE_CRT2,
            HeadRole::Slave => &NATIVE_CRT1,
        };
    }
    &LEGACY
}
