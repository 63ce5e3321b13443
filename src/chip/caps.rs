// One capability row per chip family, consulted once at detection time.

use crate::chip::variant::ChipFamily;
use crate::hw::{Bank, Regs};
use crate::hw::regs::{CR17_CRT1_ENABLE, CR63_CRT1_OFF, CR_CRT1_OFF, CR_MODE_CONTROL};

/// QueueKind is the command queue flavour of a family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueKind {
    /// 300 family: fixed 512 KiB queue at the top of video memory
    TurboQueue,
    /// 315 family: resizable queue, MMIO or VRAM fed
    MmioQueue,
}

/// Where the CRT1 on/off switch lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crt1Switch {
    /// CR17 bit 7 set = CRT1 running
    Cr17,
    /// CR63 bit 6 set = CRT1 off
    Cr63,
}

impl Crt1Switch {
    pub fn index(self) -> u8 {
        match self {
            Crt1Switch::Cr17 => CR_MODE_CONTROL,
            Crt1Switch::Cr63 => CR_CRT1_OFF,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Crt1Switch::Cr17 => CR17_CRT1_ENABLE,
            Crt1Switch::Cr63 => CR63_CRT1_OFF,
        }
    }

    /// decodes the CRT1 state from a raw register value
    pub fn decode(self, reg: u8) -> bool {
        match self {
            Crt1Switch::Cr17 => reg & CR17_CRT1_ENABLE != 0,
            Crt1Switch::Cr63 => reg & CR63_CRT1_OFF == 0,
        }
    }

    pub fn encode(self, reg: u8, enabled: bool) -> u8 {
        let on_bit = match (self, enabled) {
            (Crt1Switch::Cr17, true) | (Crt1Switch::Cr63, false) => self.bit(),
            _ => 0,
        };
        (reg & !self.bit()) | on_bit
    }

    pub fn read(self, regs: &mut Regs) -> bool {
        let val = regs.read(Bank::Cr, self.index());
        self.decode(val)
    }

    pub fn write(self, regs: &mut Regs, enabled: bool) {
        let val = regs.read(Bank::Cr, self.index());
        regs.write(Bank::Cr, self.index(), self.encode(val, enabled));
    }
}

/// Part1 00h pattern reporting a bridge that is slaved to CRT1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlaveBits {
    pub mask: u8,
    pub value: u8,
}

impl SlaveBits {
    pub fn matches(self, reg: u8) -> bool {
        reg & self.mask == self.value
    }
}

#[derive(Debug)]
pub struct FamilyCaps {
    pub family: ChipFamily,
    /// native BIOS-emulation register programming is available
    pub native_switch: bool,
    /// an independently clocked second timing generator exists
    pub dual_head: bool,
    pub queue: Option<QueueKind>,
    pub crt1_switch: Crt1Switch,
    pub slave: SlaveBits,
    /// CR80 gates a second extension bank
    pub legacy_lock: bool,
    /// CR38 carries PAL-M/PAL-N/component bits
    pub extended_tv_bits: bool,
    /// doublescanned 320x200..512x384 timings are supported
    pub synthetic_lowres: bool,
    /// maximum dot clock in kHz at 8, 16 and 24/32 bpp
    pub max_dotclock: [u32; 3],
}

impl FamilyCaps {
    pub fn max_dotclock_for(&self, depth: u8) -> u32 {
        match depth {
            0..=8 => self.max_dotclock[0],
            9..=16 => self.max_dotclock[1],
            _ => self.max_dotclock[2],
        }
    }
}

static OLD_CAPS: FamilyCaps = FamilyCaps {
    family: ChipFamily::Old,
    native_switch: false,
    dual_head: false,
    queue: None,
    crt1_switch: Crt1Switch::Cr17,
    slave: SlaveBits { mask: 0x00, value: 0xFF },
    legacy_lock: true,
    extended_tv_bits: false,
    synthetic_lowres: false,
    max_dotclock: [175_500, 135_000, 85_000],
};

static SIS530_CAPS: FamilyCaps = FamilyCaps {
    family: ChipFamily::Sis530,
    native_switch: false,
    dual_head: false,
    queue: None,
    crt1_switch: Crt1Switch::Cr17,
    slave: SlaveBits { mask: 0x00, value: 0xFF },
    legacy_lock: true,
    extended_tv_bits: false,
    synthetic_lowres: false,
    max_dotclock: [230_000, 175_500, 135_000],
};

static SIS300_CAPS: FamilyCaps = FamilyCaps {
    family: ChipFamily::Sis300,
    native_switch: true,
    dual_head: true,
    queue: Some(QueueKind::TurboQueue),
    crt1_switch: Crt1Switch::Cr17,
    slave: SlaveBits { mask: 0xA0, value: 0x20 },
    legacy_lock: false,
    extended_tv_bits: false,
    synthetic_lowres: true,
    max_dotclock: [230_000, 230_000, 162_000],
};

static SIS315_CAPS: FamilyCaps = FamilyCaps {
    family: ChipFamily::Sis315,
    native_switch: true,
    dual_head: true,
    queue: Some(QueueKind::MmioQueue),
    crt1_switch: Crt1Switch::Cr63,
    slave: SlaveBits { mask: 0x50, value: 0x10 },
    legacy_lock: false,
    extended_tv_bits: true,
    synthetic_lowres: true,
    max_dotclock: [340_000, 340_000, 270_000],
};

pub fn caps(family: ChipFamily) -> &'static FamilyCaps {
    match family {
        ChipFamily::Old => &OLD_CAPS,
        ChipFamily::Sis530 => &SIS530_CAPS,
        ChipFamily::Sis300 => &SIS300_CAPS,
        ChipFamily::Sis315 => &SIS315_CAPS,
    }
}
