// Mode catalog and validator.
//
// A rejected mode is pruned and logged, the catalog keeps the rest. The
// validator also resolves the rate index and, for the BIOS switch path,
// the VBE mode number.

use quick_error::quick_error;

use crate::bios::VbeModeInfo;
use crate::chip::{caps, BridgeFamily, ChipVariant};
use crate::context::HeadRole;
use crate::modes::bios_index::{native_mode_id, resolve_vesa};
use crate::modes::builtin::candidate_modes;
use crate::modes::descriptor::{ModeDescriptor, ModeFlags, MonitorDescriptor};
use crate::modes::rate::rate_index;
use crate::output::{Crt2Device, OutputConfig, Relation};
use crate::switch::StrategyKind;

#[cfg(test)]
#[path = "./catalog_test.rs"]
mod catalog_test;

const DEBUG_CATALOG: bool = false;

/// Low resolution timings that only exist with the bridge slaved to CRT1.
/// A dual head setup cannot use them on either head.
pub const SLAVE_ONLY_MODES: [(u16, u16); 5] = [(320, 200), (320, 240), (400, 300), (512, 384), (640, 400)];

quick_error! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RejectReason {
        BadTiming {
            display("sync and total values out of order")
        }
        InterlaceOnPanel {
            display("interlaced modes cannot drive a panel")
        }
        ExceedsPanel(width: u32, height: u32) {
            display("larger than the {}x{} panel", width, height)
        }
        Synthetic {
            display("doublescan timing not available on this output path")
        }
        TvSize(width: u32, height: u32) {
            display("larger than the TV encoder limit of {}x{}", width, height)
        }
        DotClock(clock: u32, max: u32) {
            display("dot clock {} kHz above limit {} kHz", clock, max)
        }
        SyncRange {
            display("outside the monitor sync range")
        }
        SlaveOnly {
            display("only available with the bridge in slave mode")
        }
        NoBiosMode(depth: u8) {
            display("no VBE mode number at depth {}", depth)
        }
    }
}

/// Everything the validator needs to judge a mode for one head.
#[derive(Clone, Copy)]
pub struct ValidationEnv<'a> {
    pub chip: ChipVariant,
    pub bridge: BridgeFamily,
    pub output: &'a OutputConfig,
    pub role: HeadRole,
    pub depth: u8,
    pub strategy: StrategyKind,
    pub vbe_modes: &'a [VbeModeInfo],
    pub monitor: &'a MonitorDescriptor,
}

impl<'a> ValidationEnv<'a> {
    fn drives_crt1(&self) -> bool {
        self.role.drives_crt1(self.output)
    }

    fn crt2(&self) -> Crt2Device {
        if self.role.drives_crt2(self.output) {
            self.output.crt2()
        } else {
            Crt2Device::None
        }
    }
}

/// Checks one mode, returns it with the rate index and mode number filled in.
pub fn validate_mode(env: &ValidationEnv, mode: &ModeDescriptor) -> Result<ModeDescriptor, RejectReason> {
    let family_caps = caps(env.chip.family());
    let crt2 = env.crt2();
    let (width, height) = (u32::from(mode.hdisplay), u32::from(mode.vdisplay));

    if !mode.has_ordered_timing() {
        return Err(RejectReason::BadTiming);
    }

    if let Crt2Device::Panel(panel) = crt2 {
        if mode.is_interlaced() {
            return Err(RejectReason::InterlaceOnPanel);
        }
        if width > panel.width || height > panel.height {
            return Err(RejectReason::ExceedsPanel(panel.width, panel.height));
        }
    }

    if mode.flags.contains(ModeFlags::SYNTHETIC) {
        let bridge_can = crt2.is_none() || env.bridge.is_sis_bridge();
        if !family_caps.synthetic_lowres || !bridge_can {
            return Err(RejectReason::Synthetic);
        }
    }

    if let Crt2Device::Tv { standard, .. } = crt2 {
        let (max_w, max_h) = env.bridge.tv_max_size(standard);
        if width > max_w || height > max_h {
            return Err(RejectReason::TvSize(max_w, max_h));
        }
    }

    let max_clock = family_caps.max_dotclock_for(env.depth);
    if mode.clock_khz > max_clock {
        return Err(RejectReason::DotClock(mode.clock_khz, max_clock));
    }
    if crt2 == Crt2Device::SecondVga && mode.clock_khz > env.bridge.max_crt2_dotclock() {
        return Err(RejectReason::DotClock(mode.clock_khz, env.bridge.max_crt2_dotclock()));
    }

    let monitor_attached = env.drives_crt1() || crt2 == Crt2Device::SecondVga;
    if monitor_attached && !env.monitor.in_sync_range(mode) {
        return Err(RejectReason::SyncRange);
    }

    if env.output.relation() == Relation::DualHead && SLAVE_ONLY_MODES.contains(&mode.size()) {
        return Err(RejectReason::SlaveOnly);
    }

    let mut accepted = mode.clone();
    accepted.bios_mode = match env.strategy {
        StrategyKind::Vesa => {
            let number = resolve_vesa(env.chip.family(), env.vbe_modes, mode.hdisplay, mode.vdisplay, env.depth);
            match number {
                Some(n) => Some(n),
                None => return Err(RejectReason::NoBiosMode(env.depth)),
            }
        }
        StrategyKind::Native => native_mode_id(mode.hdisplay, mode.vdisplay, env.depth).map(u16::from),
        StrategyKind::Legacy => None,
    };
    accepted.rate_index = Some(rate_index(mode.hdisplay, mode.vdisplay, mode.refresh_hz()));
    Ok(accepted)
}

/// Catalog is the ordered set of modes usable on one head
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    modes: Vec<ModeDescriptor>,
    rejected: Vec<(String, RejectReason)>,
}

impl Catalog {
    /// Builds the catalog from the monitor's modes and the built-in tables.
    pub fn build(env: &ValidationEnv) -> Catalog {
        let family_caps = caps(env.chip.family());
        let candidates = candidate_modes(family_caps, &env.monitor.modes, env.depth);
        Self::from_candidates(env, &candidates)
    }

    pub fn from_candidates(env: &ValidationEnv, candidates: &[ModeDescriptor]) -> Catalog {
        let mut catalog = Catalog::default();
        for mode in candidates {
            match validate_mode(env, mode) {
                Ok(m) => {
                    if DEBUG_CATALOG {
                        log::debug!("catalog: {} rate index {:?}", m, m.rate_index);
                    }
                    catalog.modes.push(m);
                }
                Err(reason) => {
                    log::warn!("mode {} pruned: {}", mode.name, reason);
                    catalog.rejected.push((mode.name.clone(), reason));
                }
            }
        }
        log::info!("{} modes usable, {} pruned", catalog.modes.len(), catalog.rejected.len());
        catalog
    }

    pub fn modes(&self) -> &[ModeDescriptor] {
        &self.modes
    }

    pub fn rejected(&self) -> &[(String, RejectReason)] {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn first(&self) -> Option<&ModeDescriptor> {
        self.modes.first()
    }

    pub fn find(&self, width: u16, height: u16, refresh: u32) -> Option<&ModeDescriptor> {
        self.modes
            .iter()
            .find(|m| m.size() == (width, height) && m.refresh_rounded() == refresh)
    }

    pub fn find_named(&self, name: &str) -> Option<&ModeDescriptor> {
        self.modes.iter().find(|m| m.name == name)
    }

    pub fn reason_for(&self, name: &str) -> Option<&RejectReason> {
        self.rejected.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }
}
