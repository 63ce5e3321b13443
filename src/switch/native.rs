// Native mode switch for the 300 and 315 families: the register sequence
// the BIOS would run, replayed by the driver. CRT1 goes through the VGA
// CRTC, CRT2 through the bridge Part1 timing registers.

use crate::chip::BridgeFamily;
use crate::hw::regs::{CR_MODE_NUMBER, P1_MODE_CONTROL, P4_VCLK_DEN, P4_VCLK_NUM, SR_CRT2_VCLK_DEN, SR_CRT2_VCLK_NUM};
use crate::hw::{Bank, Regs};
use crate::modes::{synthesize, ModeDescriptor};
use crate::output::Relation;
use crate::switch::crtc::program_crt1;
use crate::switch::strategy::{StrategyKind, SwitchError, SwitchJob, SwitchStrategy};

#[cfg(test)]
#[path = "./native_test.rs"]
mod native_test;

const DEBUG_NATIVE: bool = false;

/// Part1 00h for a bridge running its own timing
const P1_DIRECT: u8 = 0x00;

/// Which timing generators a native switch programs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativePath {
    /// single head: everything the output configuration asks for
    Combined,
    /// dual head master
    Crt2Only,
    /// dual head slave
    Crt1Only,
}

pub struct NativeSwitch {
    pub path: NativePath,
}

pub static NATIVE_COMBINED: NativeSwitch = NativeSwitch { path: NativePath::Combined };
pub static NATIVE_CRT2: NativeSwitch = NativeSwitch { path: NativePath::Crt2Only };
pub static NATIVE_CRT1: NativeSwitch = NativeSwitch { path: NativePath::Crt1Only };

/// Part1 08h-11h, CRT2 timing in characters and lines
fn write_crt2_timing(regs: &mut Regs, mode: &ModeDescriptor) {
    let ht = (mode.htotal >> 3) - 1;
    let hde = (mode.hdisplay >> 3) - 1;
    let hrs = mode.hsync_start >> 3;
    let hre = mode.hsync_end >> 3;
    let vt = mode.vtotal - 1;
    let vde = mode.vdisplay - 1;
    let vrs = mode.vsync_start;
    let vre = mode.vsync_end;

    let values = [
        ht as u8,
        hde as u8,
        hrs as u8,
        hre as u8,
        (((ht >> 8) & 0x0F) | (((hde >> 8) & 0x0F) << 4)) as u8,
        vt as u8,
        vde as u8,
        vrs as u8,
        (vre & 0x0F) as u8,
        (((vt >> 8) & 0x07) | (((vde >> 8) & 0x07) << 3) | (((vrs >> 8) & 0x03) << 6)) as u8,
    ];
    for (i, val) in values.iter().enumerate() {
        regs.write(Bank::Part1, 0x08 + i as u8, *val);
    }
}

fn write_crt2_clock(regs: &mut Regs, bridge: BridgeFamily, mode: &ModeDescriptor) -> Result<(), SwitchError> {
    let clock = match mode.clock_regs {
        Some(c) => c,
        None => synthesize(mode.clock_khz).ok_or(SwitchError::Replay("no CRT2 clock divider"))?,
    };
    if bridge.is_sis_bridge() {
        regs.write(Bank::Part4, P4_VCLK_NUM, clock.sr2b);
        regs.write(Bank::Part4, P4_VCLK_DEN, clock.sr2c);
    } else {
        regs.write(Bank::Sr, SR_CRT2_VCLK_NUM, clock.sr2b);
        regs.write(Bank::Sr, SR_CRT2_VCLK_DEN, clock.sr2c);
    }
    Ok(())
}

/// Programs CRT2. In mirror the bridge is slaved and takes CRT1's timing.
fn program_crt2(job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError> {
    if job.output.crt2().is_none() {
        return Err(SwitchError::Replay("no CRT2 device to program"));
    }
    if let Some(panel) = job.output.crt2().panel() {
        if u32::from(job.mode.hdisplay) > panel.width || u32::from(job.mode.vdisplay) > panel.height {
            return Err(SwitchError::Replay("mode larger than the panel"));
        }
    }
    if job.output.relation() == Relation::Mirror {
        regs.set(Bank::Part1, P1_MODE_CONTROL, !job.caps.slave.mask, job.caps.slave.value);
        return Ok(());
    }
    write_crt2_timing(regs, job.mode);
    write_crt2_clock(regs, job.bridge, job.mode)?;
    regs.set(Bank::Part1, P1_MODE_CONTROL, !job.caps.slave.mask, P1_DIRECT);
    Ok(())
}

impl SwitchStrategy for NativeSwitch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn name(&self) -> &'static str {
        match self.path {
            NativePath::Combined => "native",
            NativePath::Crt2Only => "native crt2",
            NativePath::Crt1Only => "native crt1",
        }
    }

    fn switch(&self, job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError> {
        if DEBUG_NATIVE {
            log::debug!("{} switch to {} for {}", self.name(), job.mode, job.output);
        }
        if let Some(id) = job.mode.bios_mode {
            if self.path != NativePath::Crt2Only {
                regs.write(Bank::Cr, CR_MODE_NUMBER, id as u8);
            }
        }
        match self.path {
            NativePath::Combined => {
                if job.output.crt1() {
                    program_crt1(regs, job.caps, job.mode, job.depth, job.pitch)?;
                }
                if !job.output.crt2().is_none() {
                    program_crt2(job, regs)?;
                }
            }
            NativePath::Crt2Only => program_crt2(job, regs)?,
            NativePath::Crt1Only => program_crt1(regs, job.caps, job.mode, job.depth, job.pitch)?,
        }
        Ok(())
    }
}
