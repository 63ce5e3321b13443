// Chip variants by PCI device id, grouped into the four register-level
// families that behave alike for mode switching.

use std::fmt;

pub const SIS_VENDOR_ID: u16 = 0x1039;

/// ChipVariant is the detected graphics chip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChipVariant {
    Sis5597,
    Sis6326,
    Sis530,
    Sis300,
    Sis540,
    Sis630,
    Sis315,
    Sis315H,
    Sis315Pro,
    Sis550,
    Sis650,
    Sis330,
    Sis661,
}

/// ChipFamily is the VGA engine generation of a chip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChipFamily {
    /// 5597/5598, 6326: no BIOS emulation, optional integrated TV encoder
    Old,
    /// 530/620: old engine with a turbo queue-less accelerator
    Sis530,
    /// 300/540/630/730
    Sis300,
    /// 315/550/650/740/330/661/741/760
    Sis315,
}

pub const ALL_VARIANTS: [ChipVariant; 13] = [
    ChipVariant::Sis5597,
    ChipVariant::Sis6326,
    ChipVariant::Sis530,
    ChipVariant::Sis300,
    ChipVariant::Sis540,
    ChipVariant::Sis630,
    ChipVariant::Sis315,
    ChipVariant::Sis315H,
    ChipVariant::Sis315Pro,
    ChipVariant::Sis550,
    ChipVariant::Sis650,
    ChipVariant::Sis330,
    ChipVariant::Sis661,
];

impl ChipVariant {
    pub fn from_pci_id(device: u16) -> Option<Self> {
        ALL_VARIANTS.iter().cloned().find(|v| v.pci_id() == device)
    }

    pub fn pci_id(self) -> u16 {
        match self {
            ChipVariant::Sis5597 => 0x0200,
            ChipVariant::Sis6326 => 0x6326,
            ChipVariant::Sis530 => 0x6306,
            ChipVariant::Sis300 => 0x0300,
            ChipVariant::Sis540 => 0x5300,
            ChipVariant::Sis630 => 0x6300,
            ChipVariant::Sis315 => 0x0310,
            ChipVariant::Sis315H => 0x0315,
            ChipVariant::Sis315Pro => 0x0325,
            ChipVariant::Sis550 => 0x5315,
            ChipVariant::Sis650 => 0x6325,
            ChipVariant::Sis330 => 0x0330,
            ChipVariant::Sis661 => 0x6330,
        }
    }

    pub fn family(self) -> ChipFamily {
        match self {
            ChipVariant::Sis5597 | ChipVariant::Sis6326 => ChipFamily::Old,
            ChipVariant::Sis530 => ChipFamily::Sis530,
            ChipVariant::Sis300 | ChipVariant::Sis540 | ChipVariant::Sis630 => ChipFamily::Sis300,
            _ => ChipFamily::Sis315,
        }
    }

    /// integrated chipsets share system memory and have no dedicated VRAM
    pub fn is_integrated(self) -> bool {
        match self {
            ChipVariant::Sis5597
            | ChipVariant::Sis530
            | ChipVariant::Sis540
            | ChipVariant::Sis630
            | ChipVariant::Sis550
            | ChipVariant::Sis650
            | ChipVariant::Sis661 => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChipVariant::Sis5597 => "SiS5597/5598",
            ChipVariant::Sis6326 => "SiS6326",
            ChipVariant::Sis530 => "SiS530/620",
            ChipVariant::Sis300 => "SiS300/305",
            ChipVariant::Sis540 => "SiS540",
            ChipVariant::Sis630 => "SiS630/730",
            ChipVariant::Sis315 => "SiS315",
            ChipVariant::Sis315H => "SiS315H",
            ChipVariant::Sis315Pro => "SiS315PRO",
            ChipVariant::Sis550 => "SiS550",
            ChipVariant::Sis650 => "SiS650/740",
            ChipVariant::Sis330 => "SiS330 (Xabre)",
            ChipVariant::Sis661 => "SiS661/741/760",
        }
    }
}

impl fmt::Display for ChipVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
