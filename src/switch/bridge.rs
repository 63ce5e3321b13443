// Bridge pre- and post-configuration around a mode switch.
//
// Pre writes the CRT2 target, the simulcast/independent/driver-mode control
// bits, the TV sub-standard bits and the rate index, and enables the
// command queue. Post reads the bridge back: a slaved bridge overrides
// whatever relation was intended. CRT1 is only toggled when its state
// actually changes, followed by a synchronous reset pulse.

use crate::chip::{BridgeFamily, FamilyCaps};
use crate::context::HeadRole;
use crate::hw::regs::{
    Cr30, Cr31, Cr38, CR_CRT2_CONTROL, CR_CRT2_TARGET, CR_RATE_INDEX, CR_TV_EXT, P1_MODE_CONTROL, P1_PANEL_DELAY,
    RESET_PULSE_US, RESET_RUN, RESET_SYNC, SR_RESET, TV6326_CONTROL, TV6326_PAL,
};
use crate::hw::{Bank, Regs};
use crate::options::QueueMode;
use crate::output::{BridgeMode, Crt2Device, OutputConfig, Relation, TvPlug, TvStandard};
use crate::switch::queue::enable_queue;

#[cfg(test)]
#[path = "./bridge_test.rs"]
mod bridge_test;

const DEBUG_BRIDGE: bool = false;

/// Inputs of the pre-configuration step.
pub struct BridgeSetup<'a> {
    pub caps: &'static FamilyCaps,
    pub bridge: BridgeFamily,
    pub role: HeadRole,
    pub output: &'a OutputConfig,
    pub vesa: bool,
    pub rate_index: u8,
    pub panel_delay: Option<u8>,
    pub queue_mode: QueueMode,
    pub video_memory_kb: u32,
}

/// What post-configuration found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostOutcome {
    pub slaved: bool,
    /// the relation was narrowed to mirror
    pub downgraded: bool,
    pub crt1_toggled: bool,
}

/// Asserts and releases the sequencer synchronous reset.
pub fn reset_pulse(regs: &mut Regs) {
    regs.write(Bank::Sr, SR_RESET, RESET_SYNC);
    regs.delay_us(RESET_PULSE_US);
    regs.write(Bank::Sr, SR_RESET, RESET_RUN);
}

fn has_part_banks(bridge: BridgeFamily) -> bool {
    bridge.is_sis_bridge() || bridge.is_lvds() || bridge == BridgeFamily::Chrontel7005 || bridge == BridgeFamily::Chrontel7019
}

/// True if the bridge currently follows CRT1.
pub fn bridge_slaved(regs: &mut Regs, caps: &FamilyCaps, bridge: BridgeFamily) -> bool {
    if !caps.native_switch || !has_part_banks(bridge) {
        return false;
    }
    caps.slave.matches(regs.read(Bank::Part1, P1_MODE_CONTROL))
}

fn target_bits(crt2: Crt2Device) -> Cr30 {
    match crt2 {
        Crt2Device::None => Cr30::empty(),
        Crt2Device::Panel(_) => Cr30::LCD,
        Crt2Device::SecondVga => Cr30::SECOND_VGA,
        Crt2Device::Tv { plug, .. } => match plug {
            TvPlug::Composite => Cr30::COMPOSITE,
            TvPlug::SVideo => Cr30::SVIDEO,
            TvPlug::Scart => Cr30::SCART,
            TvPlug::Component => Cr30::COMPONENT,
        },
    }
}

/// Control bits for CR30/CR31. VESA always gets the simulcast state, the
/// BIOS drives the bridge no other way.
pub fn control_bits(output: &OutputConfig, vesa: bool) -> (Cr30, Cr31) {
    let mut cr30 = target_bits(output.crt2());
    let mut cr31 = Cr31::empty();
    if vesa {
        cr30 |= Cr30::SIMULCAST;
    } else {
        match output.relation() {
            Relation::Single => cr31 |= Cr31::DRIVER_MODE,
            Relation::Mirror => {
                cr30 |= Cr30::SIMULCAST;
                cr31 |= Cr31::DRIVER_MODE;
            }
            Relation::DualHead => cr31 |= Cr31::NOT_SIMULCAST | Cr31::DRIVER_MODE,
        }
    }
    if output.crt2().is_none() {
        cr31 |= Cr31::CRT2_DISABLED;
    }
    if output.crt2().tv_standard().map_or(false, TvStandard::is_pal_family) {
        cr31 |= Cr31::PAL;
    }
    (cr30, cr31)
}

fn tv_ext_bits(crt2: Crt2Device) -> Cr38 {
    let mut bits = Cr38::empty();
    if let Crt2Device::Tv { standard, plug } = crt2 {
        match standard {
            TvStandard::PalM => bits |= Cr38::PAL_M,
            TvStandard::PalN => bits |= Cr38::PAL_N,
            _ => {}
        }
        if plug == TvPlug::Component {
            bits |= Cr38::COMPONENT;
        }
    }
    bits
}

/// CR33: CRT1 rate in the low nibble, CRT2 in the high nibble.
fn write_rate_index(regs: &mut Regs, setup: &BridgeSetup) {
    let rate = setup.rate_index & 0x0F;
    let crt1 = setup.role.drives_crt1(setup.output);
    let crt2 = setup.role.drives_crt2(setup.output) && !setup.output.crt2().is_none();
    let (mask, bits) = match (crt1, crt2) {
        (true, true) => (0x00, rate | (rate << 4)),
        (true, false) => (0xF0, rate),
        (false, true) => (0x0F, rate << 4),
        (false, false) => return,
    };
    regs.set(Bank::Cr, CR_RATE_INDEX, mask, bits);
}

/// Bridge pre-configuration, the first register writes of a mode switch.
pub fn pre_configure(regs: &mut Regs, setup: &BridgeSetup) {
    let caps = setup.caps;
    let crt2 = setup.output.crt2();

    if caps.native_switch && setup.role != HeadRole::Slave {
        let (cr30, cr31) = control_bits(setup.output, setup.vesa);
        if DEBUG_BRIDGE {
            log::debug!("bridge pre: CR30={:02X} CR31={:02X} for {}", cr30.bits(), cr31.bits(), setup.output);
        }
        regs.write(Bank::Cr, CR_CRT2_TARGET, cr30.bits());
        let keep = !(Cr31::PAL | Cr31::NOT_SIMULCAST | Cr31::CRT2_DISABLED | Cr31::DRIVER_MODE).bits();
        regs.set(Bank::Cr, CR_CRT2_CONTROL, keep, cr31.bits());
        if caps.extended_tv_bits {
            let all = (Cr38::PAL_M | Cr38::PAL_N | Cr38::COMPONENT).bits();
            regs.set(Bank::Cr, CR_TV_EXT, !all, tv_ext_bits(crt2).bits());
        }
        if let (Some(pdc), Crt2Device::Panel(_)) = (setup.panel_delay, crt2) {
            if setup.bridge.is_sis_bridge() {
                regs.set(Bank::Part1, P1_PANEL_DELAY, 0xF0, pdc & 0x0F);
            }
        }
    }
    if caps.native_switch {
        write_rate_index(regs, setup);
    }

    if setup.bridge == BridgeFamily::IntegratedTv {
        let pal = crt2.tv_standard().map_or(false, TvStandard::is_pal_family);
        let ctl = regs.read_tv6326(TV6326_CONTROL);
        let ctl = if pal { ctl | TV6326_PAL } else { ctl & !TV6326_PAL };
        regs.write_tv6326(TV6326_CONTROL, ctl);
    }

    if let Some(kind) = caps.queue {
        enable_queue(regs, kind, setup.queue_mode, setup.video_memory_kb);
    }
}

/// Sets CRT1 on or off, with a reset pulse if the state changed. Returns
/// true if it did.
pub fn apply_crt1_enable(regs: &mut Regs, caps: &FamilyCaps, enabled: bool) -> bool {
    if caps.crt1_switch.read(regs) == enabled {
        return false;
    }
    caps.crt1_switch.write(regs, enabled);
    reset_pulse(regs);
    true
}

/// Bridge post-configuration. `output` is reset to `intended`, then
/// narrowed to what the hardware actually does.
pub fn post_configure(
    regs: &mut Regs,
    caps: &FamilyCaps,
    bridge: BridgeFamily,
    role: HeadRole,
    intended: &OutputConfig,
    output: &mut OutputConfig,
) -> PostOutcome {
    *output = intended.clone();
    let slaved = bridge_slaved(regs, caps, bridge);
    let mut downgraded = false;
    if slaved && !output.crt2().is_none() {
        if output.relation() == Relation::DualHead {
            log::warn!("bridge reports slave mode in dual head, the heads are not independent");
            output.set_bridge_mode(BridgeMode::Slaved);
        } else {
            downgraded = output.downgrade_to_mirror();
            if downgraded {
                log::warn!("bridge is slaved to CRT1, output narrowed to {}", output);
            }
        }
    }

    // the master head never touches CRT1
    let crt1_toggled = match role {
        HeadRole::Master => false,
        HeadRole::Slave => apply_crt1_enable(regs, caps, true),
        HeadRole::Sole => apply_crt1_enable(regs, caps, output.crt1()),
    };
    PostOutcome { slaved, downgraded, crt1_toggled }
}
