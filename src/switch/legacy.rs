// Direct register strategy for the families without BIOS emulation: the
// standard VGA table replay, with the SiS6326 TV workaround around it.
//
// Switching while the 6326 TV encoder is attached tears the picture and
// shifts its colours. The encoder is detached during vertical blank, the
// mode is programmed, two full frames pass and the encoder is reattached.

use crate::chip::BridgeFamily;
use crate::hw::regs::{STATUS_VRETRACE, TV6326_ATTACH, TV6326_CONTROL};
use crate::hw::{wait_for, Regs};
use crate::switch::crtc::program_crt1;
use crate::switch::strategy::{StrategyKind, SwitchError, SwitchJob, SwitchStrategy};

#[cfg(test)]
#[path = "./legacy_test.rs"]
mod legacy_test;

/// input status polls before a vertical blank wait gives up
pub const VBLANK_POLLS: u32 = 100_000;

pub struct LegacySwitch;

pub static LEGACY: LegacySwitch = LegacySwitch;

fn wait_retrace(regs: &mut Regs, in_retrace: bool) {
    let res = wait_for(|| (regs.input_status() & STATUS_VRETRACE != 0) == in_retrace, VBLANK_POLLS);
    if let Err(e) = res {
        log::warn!("vertical retrace wait: {}", e);
    }
}

/// waits for the start of the next vertical blank
fn next_vblank(regs: &mut Regs) {
    wait_retrace(regs, false);
    wait_retrace(regs, true);
}

impl SwitchStrategy for LegacySwitch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Legacy
    }

    fn name(&self) -> &'static str {
        "legacy"
    }

    fn switch(&self, job: &SwitchJob, regs: &mut Regs) -> Result<(), SwitchError> {
        let tv_live = job.bridge == BridgeFamily::IntegratedTv
            && job.output.tv_active()
            && regs.read_tv6326(TV6326_CONTROL) & TV6326_ATTACH != 0;

        if tv_live {
            next_vblank(regs);
            let ctl = regs.read_tv6326(TV6326_CONTROL);
            regs.write_tv6326(TV6326_CONTROL, ctl & !TV6326_ATTACH);
        }

        let res = program_crt1(regs, job.caps, job.mode, job.depth, job.pitch);

        if tv_live {
            next_vblank(regs);
            next_vblank(regs);
            let ctl = regs.read_tv6326(TV6326_CONTROL);
            regs.write_tv6326(TV6326_CONTROL, ctl | TV6326_ATTACH);
        }
        res
    }
}
