// Mode switch through the VBE BIOS. The BIOS is free to reprogram the
// bridge and the queue, post-configuration reads everything back.

use crate::bios::{set_logical_scanline, set_vbe_mode};
use crate::hw::Regs;
use crate::switch::strategy::{StrategyKind, SwitchError, SwitchJob, SwitchStrategy};

pub struct VesaSwitch;

pub static VESA: VesaSwitch = VesaSwitch;

impl SwitchStrategy for VesaSwitch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vesa
    }

    fn name(&self) -> &'static str {
        "vesa"
    }

    fn switch(&self, job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError> {
        let number = job.mode.bios_mode.ok_or(SwitchError::NoModeNumber)?;
        log::debug!("VBE set mode {:03X} for {}", number, job.mode.name);
        set_vbe_mode(regs, number)?;
        Ok(())
    }

    /// The BIOS sets the scan line to the mode width, a wider virtual
    /// screen needs the logical length programmed.
    fn finish(&self, job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError> {
        if job.pitch == job.mode.hdisplay {
            return Ok(());
        }
        let bytes = set_logical_scanline(regs, job.pitch)?;
        log::debug!("logical scan line {} pixels, {} bytes", job.pitch, bytes);
        Ok(())
    }
}
