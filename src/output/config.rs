// The resolved output configuration of one head.
//
// Relation, CRT2 device and bridge mode are kept as separate fields so a
// combination like "dual head without a CRT2 device" cannot be built.
// `OutputFlags` is the packed form the BIOS-era code paths and the logs use.

use std::fmt;

use bitflags::bitflags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// only one CRT is active
    Single,
    /// both CRTs show the same timing
    Mirror,
    /// two heads with independent timings
    DualHead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TvStandard {
    Pal,
    Ntsc,
    PalM,
    PalN,
}

impl TvStandard {
    /// standards transmitted with the PAL colour carrier bit set
    pub fn is_pal_family(self) -> bool {
        self != TvStandard::Ntsc
    }

    pub fn is_sub_standard(self) -> bool {
        match self {
            TvStandard::PalM | TvStandard::PalN => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TvPlug {
    Composite,
    SVideo,
    Scart,
    Component,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PanelInfo {
    pub width: u32,
    pub height: u32,
    /// CR36 panel type code as reported by the BIOS
    pub type_code: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Crt2Device {
    None,
    Panel(PanelInfo),
    Tv { standard: TvStandard, plug: TvPlug },
    SecondVga,
}

impl Crt2Device {
    pub fn is_none(&self) -> bool {
        *self == Crt2Device::None
    }

    pub fn is_tv(&self) -> bool {
        match self {
            Crt2Device::Tv { .. } => true,
            _ => false,
        }
    }

    pub fn panel(&self) -> Option<PanelInfo> {
        match self {
            Crt2Device::Panel(p) => Some(*p),
            _ => None,
        }
    }

    pub fn tv_standard(&self) -> Option<TvStandard> {
        match self {
            Crt2Device::Tv { standard, .. } => Some(*standard),
            _ => None,
        }
    }
}

/// Whether the bridge runs its own timing or follows CRT1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BridgeMode {
    Direct,
    Slaved,
}

/// OutputConfig is only built through its constructors, which keep the
/// relation consistent with the active outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    relation: Relation,
    crt1: bool,
    crt2: Crt2Device,
    bridge_mode: BridgeMode,
}

impl OutputConfig {
    pub fn crt1_only() -> Self {
        OutputConfig {
            relation: Relation::Single,
            crt1: true,
            crt2: Crt2Device::None,
            bridge_mode: BridgeMode::Direct,
        }
    }

    /// CRT2 alone, CRT1 switched off
    pub fn crt2_only(crt2: Crt2Device) -> Self {
        if crt2.is_none() {
            return Self::crt1_only();
        }
        OutputConfig {
            relation: Relation::Single,
            crt1: false,
            crt2,
            bridge_mode: BridgeMode::Direct,
        }
    }

    pub fn mirror(crt2: Crt2Device) -> Self {
        if crt2.is_none() {
            return Self::crt1_only();
        }
        OutputConfig {
            relation: Relation::Mirror,
            crt1: true,
            crt2,
            bridge_mode: BridgeMode::Direct,
        }
    }

    /// Returns None without a CRT2 device, dual head needs one.
    pub fn dual_head(crt2: Crt2Device) -> Option<Self> {
        if crt2.is_none() {
            return None;
        }
        Some(OutputConfig {
            relation: Relation::DualHead,
            crt1: true,
            crt2,
            bridge_mode: BridgeMode::Direct,
        })
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn crt1(&self) -> bool {
        self.crt1
    }

    pub fn crt2(&self) -> Crt2Device {
        self.crt2
    }

    pub fn bridge_mode(&self) -> BridgeMode {
        self.bridge_mode
    }

    pub fn tv_active(&self) -> bool {
        self.crt2.is_tv()
    }

    /// A slaved bridge mirrors CRT1 whatever was asked for, so CRT1 runs
    /// too. Returns true if the relation changed. Dual head and CRT1-only
    /// are left alone.
    pub(crate) fn downgrade_to_mirror(&mut self) -> bool {
        self.bridge_mode = BridgeMode::Slaved;
        if self.relation == Relation::Single && !self.crt2.is_none() {
            self.relation = Relation::Mirror;
            self.crt1 = true;
            return true;
        }
        false
    }

    pub(crate) fn set_bridge_mode(&mut self, mode: BridgeMode) {
        self.bridge_mode = mode;
    }

    pub fn flags(&self) -> OutputFlags {
        let mut flags = OutputFlags::empty();
        if self.crt1 {
            flags |= OutputFlags::CRT1;
        }
        match self.crt2 {
            Crt2Device::None => {}
            Crt2Device::Panel(_) => flags |= OutputFlags::CRT2_LCD,
            Crt2Device::SecondVga => flags |= OutputFlags::CRT2_VGA,
            Crt2Device::Tv { standard, plug } => {
                flags |= OutputFlags::CRT2_TV;
                flags |= match standard {
                    TvStandard::Pal => OutputFlags::TV_PAL,
                    TvStandard::Ntsc => OutputFlags::TV_NTSC,
                    TvStandard::PalM => OutputFlags::TV_PAL | OutputFlags::TV_PALM,
                    TvStandard::PalN => OutputFlags::TV_PAL | OutputFlags::TV_PALN,
                };
                flags |= match plug {
                    TvPlug::Composite => OutputFlags::TV_AVIDEO,
                    TvPlug::SVideo => OutputFlags::TV_SVIDEO,
                    TvPlug::Scart => OutputFlags::TV_SCART,
                    TvPlug::Component => OutputFlags::TV_YPBPR,
                };
            }
        }
        flags |= match self.relation {
            Relation::Single => OutputFlags::SINGLE_MODE,
            Relation::Mirror => OutputFlags::MIRROR_MODE,
            Relation::DualHead => OutputFlags::DUALVIEW_MODE,
        };
        if self.bridge_mode == BridgeMode::Slaved {
            flags |= OutputFlags::BRIDGE_SLAVED;
        }
        flags
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let crt2 = match self.crt2 {
            Crt2Device::None => "none".to_owned(),
            Crt2Device::Panel(p) => format!("panel {}x{}", p.width, p.height),
            Crt2Device::Tv { standard, plug } => format!("tv {:?}/{:?}", standard, plug),
            Crt2Device::SecondVga => "vga".to_owned(),
        };
        write!(
            f,
            "{:?} crt1={} crt2={} bridge={:?}",
            self.relation,
            if self.crt1 { "on" } else { "off" },
            crt2,
            self.bridge_mode
        )
    }
}

bitflags! {
    /// packed output description
    pub struct OutputFlags: u32 {
        const CRT2_LCD = 0x0000_0002;
        const CRT2_TV = 0x0000_0004;
        const CRT2_VGA = 0x0000_0008;
        const TV_PAL = 0x0000_0010;
        const TV_NTSC = 0x0000_0020;
        const TV_PALM = 0x0000_0040;
        const TV_PALN = 0x0000_0080;
        const TV_SVIDEO = 0x0000_0100;
        const TV_AVIDEO = 0x0000_0200;
        const TV_SCART = 0x0000_0400;
        const TV_YPBPR = 0x0000_0800;
        const SINGLE_MODE = 0x0000_2000;
        const MIRROR_MODE = 0x0000_4000;
        const DUALVIEW_MODE = 0x0000_8000;
        const BRIDGE_SLAVED = 0x0001_0000;
        const CRT1 = 0x0008_0000;

        const CRT2_MASK = Self::CRT2_LCD.bits | Self::CRT2_TV.bits | Self::CRT2_VGA.bits;
        const RELATION_MASK = Self::SINGLE_MODE.bits | Self::MIRROR_MODE.bits | Self::DUALVIEW_MODE.bits;
    }
}

impl OutputFlags {
    /// the relation encoded in the flags, None unless exactly one bit is set
    pub fn relation(self) -> Option<Relation> {
        let rel = self & OutputFlags::RELATION_MASK;
        if rel == OutputFlags::SINGLE_MODE {
            Some(Relation::Single)
        } else if rel == OutputFlags::MIRROR_MODE {
            Some(Relation::Mirror)
        } else if rel == OutputFlags::DUALVIEW_MODE {
            Some(Relation::DualHead)
        } else {
            None
        }
    }
}
