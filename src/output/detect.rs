// Output detection and relation derivation.
//
// Detection runs in a fixed order: CRT1, bridge, panel, TV, second VGA.
// Whatever cannot be found narrows the configuration and is logged, only
// an impossible dual head setup is an error.

use quick_error::quick_error;

use crate::chip::{caps, detect_bridge, BridgeFamily, ChipFamily, ChipVariant};
use crate::hw::regs::{
    Cr31, Cr32, Cr38, CR_CONNECTION, CR_CRT2_CONTROL, CR_PANEL_TYPE, CR_TV_EXT, TV6326_CONTROL, TV6326_PAL,
    TV6326_PRESENT, TV6326_SVIDEO,
};
use crate::hw::{Bank, Regs};
use crate::options::{Crt2Type, Options};
use crate::output::config::{Crt2Device, OutputConfig, PanelInfo, TvPlug, TvStandard};

#[cfg(test)]
#[path = "./detect_test.rs"]
mod detect_test;

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DetectError {
        UnknownPanel(code: u8) {
            display("unknown panel type {:02X}, panel ignored", code)
        }
        ForcedMissing(kind: Crt2Type) {
            display("forced CRT2 type {:?} was not detected, using detected devices", kind)
        }
        StandardUnsupported(standard: TvStandard, bridge: BridgeFamily) {
            display("{:?} does not support TV standard {:?}", bridge, standard)
        }
        PlugUnsupported(plug: TvPlug, bridge: BridgeFamily) {
            display("{:?} does not support TV plug {:?}", bridge, plug)
        }
        Crt1Required {
            display("CRT1 cannot be switched off without a CRT2 device")
        }
    }
}

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BindError {
        UnknownChip(device: u16) {
            display("unsupported PCI device {:04X}", device)
        }
        DualHeadUnsupported(chip: ChipVariant) {
            display("{} has no second timing generator", chip)
        }
        NoCrt2 {
            display("dual head requires a CRT2 device, none detected")
        }
        NoIndependentTiming(bridge: BridgeFamily) {
            display("{:?} cannot run a timing independent from CRT1", bridge)
        }
        TooManyHeads {
            display("both heads are already bound")
        }
    }
}

/// Detected is what the hardware reports, before overrides
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detected {
    pub crt1: bool,
    pub bridge: BridgeFamily,
    pub panel: Option<PanelInfo>,
    pub tv: Option<(TvStandard, TvPlug)>,
    pub second_vga: bool,
}

/// CR36 low nibble
pub fn panel_from_type(code: u8) -> Option<PanelInfo> {
    let (width, height) = match code & 0x0F {
        0x1 => (800, 600),
        0x2 => (1024, 768),
        0x3 => (1280, 1024),
        0x4 => (640, 480),
        0x5 => (1024, 600),
        0x6 => (1152, 864),
        0x7 => (1280, 960),
        0x9 => (1400, 1050),
        0xA => (1280, 768),
        0xB => (1600, 1200),
        _ => return None,
    };
    Some(PanelInfo { width, height, type_code: code & 0x0F })
}

pub fn probe_outputs(regs: &mut Regs, chip: ChipVariant) -> Detected {
    let family = chip.family();
    let native = caps(family).native_switch;
    let cr32 = if native {
        Cr32::from_bits_truncate(regs.read(Bank::Cr, CR_CONNECTION))
    } else {
        Cr32::CRT1
    };

    let crt1 = cr32.contains(Cr32::CRT1);
    let bridge = detect_bridge(regs, chip);
    log::debug!("{}: crt1={} bridge={:?}", chip, crt1, bridge);

    let mut panel = None;
    if bridge.supports_panel() && cr32.contains(Cr32::LCD) {
        let code = regs.read(Bank::Cr, CR_PANEL_TYPE) & 0x0F;
        panel = panel_from_type(code);
        if panel.is_none() {
            log::warn!("{}", DetectError::UnknownPanel(code));
        }
    }

    let tv = if bridge == BridgeFamily::IntegratedTv {
        probe_tv6326(regs)
    } else if bridge.supports_tv() {
        probe_tv(regs, family, bridge, cr32)
    } else {
        None
    };

    let second_vga = bridge.supports_second_vga() && cr32.contains(Cr32::SECOND_VGA);

    Detected { crt1, bridge, panel, tv, second_vga }
}

fn probe_tv6326(regs: &mut Regs) -> Option<(TvStandard, TvPlug)> {
    let ctl = regs.read_tv6326(TV6326_CONTROL);
    if ctl & TV6326_PRESENT == 0 {
        return None;
    }
    let standard = if ctl & TV6326_PAL != 0 { TvStandard::Pal } else { TvStandard::Ntsc };
    let plug = if ctl & TV6326_SVIDEO != 0 { TvPlug::SVideo } else { TvPlug::Composite };
    Some((standard, plug))
}

fn probe_tv(regs: &mut Regs, family: ChipFamily, bridge: BridgeFamily, cr32: Cr32) -> Option<(TvStandard, TvPlug)> {
    let extended = caps(family).extended_tv_bits;
    let cr38 = if extended {
        Cr38::from_bits_truncate(regs.read(Bank::Cr, CR_TV_EXT))
    } else {
        Cr38::empty()
    };

    let plug = if cr38.contains(Cr38::COMPONENT) && bridge.supports_component() {
        TvPlug::Component
    } else if cr32.contains(Cr32::SVIDEO) {
        TvPlug::SVideo
    } else if cr32.contains(Cr32::COMPOSITE) {
        TvPlug::Composite
    } else if cr32.contains(Cr32::SCART) {
        TvPlug::Scart
    } else {
        return None;
    };

    let cr31 = Cr31::from_bits_truncate(regs.read(Bank::Cr, CR_CRT2_CONTROL));
    let mut standard = if cr31.contains(Cr31::PAL) { TvStandard::Pal } else { TvStandard::Ntsc };
    if standard == TvStandard::Pal && bridge.supports_pal_mn() {
        if cr38.contains(Cr38::PAL_M) {
            standard = TvStandard::PalM;
        } else if cr38.contains(Cr38::PAL_N) {
            standard = TvStandard::PalN;
        }
    }
    Some((standard, plug))
}

fn plug_supported(bridge: BridgeFamily, plug: TvPlug) -> bool {
    match plug {
        TvPlug::Component => bridge.supports_component(),
        TvPlug::Scart => bridge.is_sis_bridge(),
        _ => true,
    }
}

fn standard_supported(bridge: BridgeFamily, standard: TvStandard) -> bool {
    !standard.is_sub_standard() || bridge.supports_pal_mn()
}

fn pick_forced(found: Option<Crt2Device>, kind: Crt2Type, fallback: Crt2Device) -> Crt2Device {
    match found {
        Some(dev) => dev,
        None => {
            log::warn!("{}", DetectError::ForcedMissing(kind));
            fallback
        }
    }
}

fn apply_tv_overrides(crt2: Crt2Device, bridge: BridgeFamily, opts: &Options) -> Crt2Device {
    let (mut standard, mut plug) = match crt2 {
        Crt2Device::Tv { standard, plug } => (standard, plug),
        other => return other,
    };
    if let Some(s) = opts.force_tv_standard {
        if standard_supported(bridge, s) {
            standard = s;
        } else {
            log::warn!("{}", DetectError::StandardUnsupported(s, bridge));
        }
    }
    if let Some(p) = opts.force_tv_plug {
        if plug_supported(bridge, p) {
            plug = p;
        } else {
            log::warn!("{}", DetectError::PlugUnsupported(p, bridge));
        }
    }
    Crt2Device::Tv { standard, plug }
}

/// 300 family LVDS and Chrontel paths share their bandwidth with CRT1 at
/// 8 bpp and cannot source the panel without it.
fn crt1_required(family: ChipFamily, bridge: BridgeFamily, depth: u8) -> bool {
    family == ChipFamily::Sis300 && depth == 8 && (bridge.is_lvds() || bridge == BridgeFamily::Chrontel7005)
}

/// Picks the CRT2 device, applies the overrides and composes the relation.
pub fn derive_output(detected: &Detected, chip: ChipVariant, opts: &Options, dual_head: bool) -> Result<OutputConfig, BindError> {
    let family = chip.family();
    let bridge = detected.bridge;

    let panel = detected.panel.filter(|_| bridge.supports_panel()).map(Crt2Device::Panel);
    let tv = detected
        .tv
        .filter(|_| bridge.supports_tv())
        .map(|(standard, plug)| Crt2Device::Tv { standard, plug });
    let vga = if detected.second_vga && bridge.supports_second_vga() {
        Some(Crt2Device::SecondVga)
    } else {
        None
    };
    let by_priority = panel.or(tv).or(vga).unwrap_or(Crt2Device::None);

    let crt2 = match opts.force_crt2_type {
        None => by_priority,
        Some(Crt2Type::None) => Crt2Device::None,
        Some(Crt2Type::Lcd) => pick_forced(panel, Crt2Type::Lcd, by_priority),
        Some(Crt2Type::Tv) => pick_forced(tv, Crt2Type::Tv, by_priority),
        Some(Crt2Type::Vga) => pick_forced(vga, Crt2Type::Vga, by_priority),
    };
    let crt2 = apply_tv_overrides(crt2, bridge, opts);

    if dual_head {
        if !caps(family).dual_head {
            return Err(BindError::DualHeadUnsupported(chip));
        }
        if !bridge.independent_timing() && !crt2.is_none() {
            return Err(BindError::NoIndependentTiming(bridge));
        }
        if opts.force_crt1 == Some(false) {
            log::warn!("CRT1 is the slave head in dual head mode, ignoring forced CRT1 off");
        }
        return OutputConfig::dual_head(crt2).ok_or(BindError::NoCrt2);
    }

    let mut crt1 = detected.crt1 || crt2.is_none();
    if let Some(force) = opts.force_crt1 {
        if !force && crt2.is_none() {
            log::warn!("{}", DetectError::Crt1Required);
        } else {
            crt1 = force;
        }
    }
    if !crt1 && crt1_required(family, bridge, opts.depth) {
        log::info!("CRT1 forced on, {:?} cannot drive CRT2 alone at {} bpp", bridge, opts.depth);
        crt1 = true;
    }
    if !crt1 && opts.use_vesa {
        log::info!("CRT1 forced on, the VBE BIOS only drives CRT2 simultaneously");
        crt1 = true;
    }

    let config = if crt2.is_none() {
        OutputConfig::crt1_only()
    } else if !crt1 {
        OutputConfig::crt2_only(crt2)
    } else {
        OutputConfig::mirror(crt2)
    };
    log::info!("{}: {}", chip, config);
    Ok(config)
}
